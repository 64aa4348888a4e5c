//! BlobFS CLI library

pub mod commands;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use blobfs_core::{BlobFs, BlobFsConfig, RecordStore};
use blobfs_sqlite::{Database, SqliteConfig, SqliteRecordStore};

// Re-export CLI types for testing
pub use clap::{Parser, Subcommand};
pub use commands::Commands;

#[derive(Parser)]
#[command(name = "blobfs")]
#[command(about = "Chunked blob storage over SQLite")]
#[command(version, author, long_about = None)]
pub struct Cli {
    /// Database file (in-memory when omitted)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn load_config(&self) -> Result<BlobFsConfig> {
        match &self.config {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                let config: BlobFsConfig = serde_json::from_str(&content)?;
                Ok(config)
            }
            None => Ok(BlobFsConfig::default()),
        }
    }

    /// Open the blob filesystem selected by the global options.
    pub async fn open_fs(&self) -> Result<BlobFs> {
        let db = Database::open_with(&SqliteConfig {
            path: self.db.clone(),
        })?;
        let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(db));
        Ok(BlobFs::open(store, self.load_config()?).await?)
    }
}
