//! Configuration types for BlobFS Core

use serde::{Deserialize, Serialize};

use crate::error::{BlobFsError, BlobFsResult};
use crate::store::SEPARATOR;

pub const DEFAULT_BLOCK_SIZE: u32 = 4096;
pub const DEFAULT_NAMESPACE: &str = "blobfs";

/// Main filesystem configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobFsConfig {
    /// Root namespace under which the config, node and blob namespaces live.
    pub namespace: String,
    /// Block size given to new nodes. Only used when the store has no
    /// persisted settings yet.
    pub block_size: u32,
}

impl BlobFsConfig {
    pub fn validate(&self) -> BlobFsResult<()> {
        if self.block_size == 0 {
            return Err(BlobFsError::InvalidArgument("block size must be positive".into()));
        }
        if self.namespace.is_empty() || self.namespace.contains(SEPARATOR) {
            return Err(BlobFsError::InvalidArgument(format!(
                "invalid namespace {:?}",
                self.namespace
            )));
        }
        Ok(())
    }
}

impl Default for BlobFsConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}
