//! SQLite record store for BlobFS.
//!
//! Every record lives in a single `records` table keyed by its fully
//! namespaced key, which keeps prefix scans on the primary key index.

pub mod connection;
pub mod migrations;
pub mod schema;
pub mod store;

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for database operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {message}")]
    Migration { message: String },

    #[error("Generic database error: {0}")]
    Generic(String),
}

impl Error {
    /// Create a new migration error.
    pub fn migration<S: Into<String>>(message: S) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }

    /// Create a new generic database error.
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }
}

impl From<Error> for blobfs_core::StoreError {
    fn from(err: Error) -> Self {
        blobfs_core::StoreError::backend(err.to_string())
    }
}

/// Database connection and management.
pub use connection::{Database, SqliteConfig};

/// Record store backed by the database.
pub use store::SqliteRecordStore;

/// Schema definitions and constants.
pub use schema::*;
