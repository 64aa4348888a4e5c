//! Error types for BlobFS Core

use crate::store::StoreError;
use crate::types::NodeId;

/// Core blob storage error type
#[derive(thiserror::Error, Debug)]
pub enum BlobFsError {
    #[error("node not found: {0}")]
    NotFound(NodeId),
    #[error("parent node not found: {0}")]
    ParentNotFound(NodeId),
    #[error("node already exists: {0}")]
    AlreadyExists(NodeId),
    #[error("not a directory: {0}")]
    NotADirectory(NodeId),
    #[error("is a directory: {0}")]
    IsADirectory(NodeId),
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(NodeId),
    #[error("invalid position {position} (size is {size})")]
    InvalidPosition { position: u64, size: u64 },
    #[error("corrupt state: block {block} of node {node} is missing")]
    CorruptState { node: NodeId, block: u64 },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cursor is closed")]
    Closed,
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

pub type BlobFsResult<T> = Result<T, BlobFsError>;
