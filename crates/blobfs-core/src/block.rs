//! Per-node block namespace access

use std::sync::Arc;

use tracing::debug;

use crate::error::{BlobFsError, BlobFsResult};
use crate::store::{Namespace, RecordStore};
use crate::types::NodeId;

/// Fixed-size blocks of one node, keyed by decimal block index.
#[derive(Clone)]
pub struct BlockStore {
    store: Arc<dyn RecordStore>,
    ns: Namespace,
    node: NodeId,
    block_size: u32,
}

impl BlockStore {
    pub(crate) fn new(store: Arc<dyn RecordStore>, ns: Namespace, node: NodeId, block_size: u32) -> Self {
        Self {
            store,
            ns,
            node,
            block_size,
        }
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Fetch a persisted block.
    pub async fn load(&self, index: u64) -> BlobFsResult<Option<Vec<u8>>> {
        let block = self.store.get(&self.ns, &index.to_string()).await?;
        if let Some(data) = &block {
            if data.len() != self.block_size as usize {
                return Err(BlobFsError::CorruptState {
                    node: self.node.clone(),
                    block: index,
                });
            }
        }
        debug!(node = %self.node, block = index, found = block.is_some(), "loaded block");
        Ok(block)
    }

    /// Persist a full block.
    pub async fn store(&self, index: u64, data: &[u8]) -> BlobFsResult<()> {
        if data.len() != self.block_size as usize {
            return Err(BlobFsError::InvalidArgument(format!(
                "block {index} has {} bytes, expected {}",
                data.len(),
                self.block_size
            )));
        }
        self.store.put(&self.ns, &index.to_string(), data).await?;
        debug!(node = %self.node, block = index, "flushed block");
        Ok(())
    }

    /// Indexes of the persisted blocks in ascending order.
    pub async fn indexes(&self) -> BlobFsResult<Vec<u64>> {
        let mut indexes: Vec<u64> = self
            .store
            .keys(&self.ns)
            .await?
            .iter()
            .filter_map(|key| key.parse().ok())
            .collect();
        indexes.sort_unstable();
        Ok(indexes)
    }

    /// Delete every persisted block, returning how many were removed.
    pub async fn remove_all(&self) -> BlobFsResult<usize> {
        let mut removed = 0;
        for index in self.indexes().await? {
            if self.store.delete(&self.ns, &index.to_string()).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;

    fn blocks(store: Arc<MemoryRecordStore>) -> BlockStore {
        let ns = Namespace::root("test").child("blob").child("f");
        BlockStore::new(store, ns, NodeId::from("f"), 4)
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let blocks = blocks(Arc::new(MemoryRecordStore::new()));
        assert_eq!(blocks.load(0).await.unwrap(), None);

        blocks.store(0, &[1, 2, 3, 4]).await.unwrap();
        assert_eq!(blocks.load(0).await.unwrap(), Some(vec![1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn test_rejects_partial_block() {
        let blocks = blocks(Arc::new(MemoryRecordStore::new()));
        let err = blocks.store(0, &[1, 2]).await.unwrap_err();
        assert!(matches!(err, BlobFsError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_wrong_length_record_is_corrupt() {
        let store = Arc::new(MemoryRecordStore::new());
        let blocks = blocks(store.clone());
        let ns = Namespace::root("test").child("blob").child("f");
        store.put(&ns, "3", &[1]).await.unwrap();

        let err = blocks.load(3).await.unwrap_err();
        assert!(matches!(err, BlobFsError::CorruptState { block: 3, .. }));
    }

    #[tokio::test]
    async fn test_indexes_sort_numerically() {
        let blocks = blocks(Arc::new(MemoryRecordStore::new()));
        for index in [10, 2, 0] {
            blocks.store(index, &[0; 4]).await.unwrap();
        }
        assert_eq!(blocks.indexes().await.unwrap(), vec![0, 2, 10]);
        assert_eq!(blocks.remove_all().await.unwrap(), 3);
        assert!(blocks.indexes().await.unwrap().is_empty());
    }
}
