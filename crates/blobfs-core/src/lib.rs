//! BlobFS Core — chunked blob storage over a keyed record store
//!
//! Blobs are split into fixed-size blocks stored as individual records next
//! to a small metadata record per node. A [`Cursor`] provides random-access
//! reads and writes over one blob while keeping a single block resident.

pub mod block;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fs;
pub mod node;
pub mod store;
pub mod types;

// Re-export key types for convenience
pub use block::BlockStore;
pub use config::{BlobFsConfig, DEFAULT_BLOCK_SIZE, DEFAULT_NAMESPACE};
pub use cursor::Cursor;
pub use error::{BlobFsError, BlobFsResult};
pub use fs::BlobFs;
pub use node::NodeStore;
pub use store::{MemoryRecordStore, Namespace, RecordStore, StoreError, StoreResult};
pub use types::*;
