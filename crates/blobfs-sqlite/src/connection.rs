//! Database connection management.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::migrations::MigrationManager;

/// Where the database lives.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file; an in-memory database is used when unset.
    pub path: Option<PathBuf>,
}

/// Database connection wrapper shared between clones.
#[derive(Debug, Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open a new database connection at the specified path.
    ///
    /// If the path doesn't exist, the database will be created.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        debug!(path = %path.as_ref().display(), "opening database");
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> crate::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn open_with(config: &SqliteConfig) -> crate::Result<Self> {
        match &config.path {
            Some(path) => Self::open(path),
            None => Self::open_in_memory(),
        }
    }

    fn from_connection(conn: Connection) -> crate::Result<Self> {
        let db = Self {
            connection: Arc::new(Mutex::new(conn)),
        };
        db.transaction(MigrationManager::migrate)?;
        Ok(db)
    }

    /// Lock the underlying connection.
    pub fn lock(&self) -> crate::Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| crate::Error::generic(format!("Failed to acquire database lock: {}", e)))
    }

    /// Execute a transaction with automatic rollback on error.
    pub fn transaction<F, T>(&self, f: F) -> crate::Result<T>
    where
        F: FnOnce(&Connection) -> crate::Result<T>,
    {
        let conn = self.lock()?;

        let tx = conn.unchecked_transaction()?;
        match f(&tx) {
            Ok(result) => {
                tx.commit()?;
                Ok(result)
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }
}
