//! Blob filesystem facade

use std::sync::Arc;

use tracing::info;

use crate::config::BlobFsConfig;
use crate::cursor::Cursor;
use crate::error::BlobFsResult;
use crate::node::NodeStore;
use crate::store::{Namespace, RecordStore};
use crate::types::{NodeId, NodeKind, NodeMeta, Settings};

const SETTINGS_KEY: &str = "settings";

/// Entry point tying the config, node and blob namespaces of one store
/// together.
#[derive(Clone)]
pub struct BlobFs {
    settings: Settings,
    nodes: NodeStore,
}

impl BlobFs {
    /// Open the filesystem rooted at `config.namespace`. Settings already
    /// persisted in the store take precedence over `config`.
    pub async fn open(store: Arc<dyn RecordStore>, config: BlobFsConfig) -> BlobFsResult<Self> {
        config.validate()?;
        let root = Namespace::root(&config.namespace);
        let config_ns = root.child("config");

        let settings = match store.get(&config_ns, SETTINGS_KEY).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => {
                let settings = Settings {
                    block_size: config.block_size,
                };
                store
                    .put(&config_ns, SETTINGS_KEY, &serde_json::to_vec(&settings)?)
                    .await?;
                info!(namespace = %root, block_size = settings.block_size, "initialized blob filesystem");
                settings
            }
        };

        Ok(Self {
            nodes: NodeStore::new(store, &root),
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// Create a node with the default block size.
    pub async fn create_node(
        &self,
        id: &NodeId,
        name: &str,
        kind: NodeKind,
        parent: Option<&NodeId>,
    ) -> BlobFsResult<NodeMeta> {
        self.nodes
            .create_node(id, name, kind, self.settings.block_size, parent)
            .await
    }

    pub async fn create_node_with_block_size(
        &self,
        id: &NodeId,
        name: &str,
        kind: NodeKind,
        block_size: u32,
        parent: Option<&NodeId>,
    ) -> BlobFsResult<NodeMeta> {
        self.nodes.create_node(id, name, kind, block_size, parent).await
    }

    pub async fn stat(&self, id: &NodeId) -> BlobFsResult<NodeMeta> {
        self.nodes.get_node(id).await
    }

    pub async fn children(&self, id: &NodeId) -> BlobFsResult<Vec<NodeId>> {
        self.nodes.children(id).await
    }

    pub async fn remove_node(&self, id: &NodeId) -> BlobFsResult<()> {
        self.nodes.remove_node(id).await
    }

    /// Open a cursor on a file node and refresh its access time.
    pub async fn open_cursor(&self, id: &NodeId) -> BlobFsResult<Cursor> {
        let cursor = Cursor::open(&self.nodes, id).await?;
        self.nodes.touch(id).await?;
        Ok(cursor)
    }

    /// Read up to `len` bytes starting at `start`; the result is shorter
    /// when the blob ends first.
    pub async fn read_range(&self, id: &NodeId, start: u64, len: usize) -> BlobFsResult<Vec<u8>> {
        let mut cursor = self.open_cursor(id).await?;
        let mut buf = vec![0; len];
        let n = cursor.read_at(start, &mut buf).await?;
        buf.truncate(n);
        cursor.close().await?;
        Ok(buf)
    }

    /// Write `data` at `position` and persist it.
    pub async fn write_at(&self, id: &NodeId, position: u64, data: &[u8]) -> BlobFsResult<usize> {
        let mut cursor = self.open_cursor(id).await?;
        let n = cursor.write_at(position, data).await?;
        cursor.close().await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlobFsError;
    use crate::store::MemoryRecordStore;

    fn small_blocks() -> BlobFsConfig {
        BlobFsConfig {
            block_size: 4,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_settings_persist_across_opens() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let fs = BlobFs::open(store.clone(), small_blocks()).await.unwrap();
        assert_eq!(fs.settings().block_size, 4);

        let reopened = BlobFs::open(store, BlobFsConfig::default()).await.unwrap();
        assert_eq!(reopened.settings().block_size, 4);
    }

    #[tokio::test]
    async fn test_settings_record_location() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        BlobFs::open(store.clone(), small_blocks()).await.unwrap();

        let config = Namespace::root("blobfs").child("config");
        let raw = store.get(&config, SETTINGS_KEY).await.unwrap().unwrap();
        let settings: Settings = serde_json::from_slice(&raw).unwrap();
        assert_eq!(settings, Settings { block_size: 4 });
    }

    #[tokio::test]
    async fn test_create_node_uses_default_block_size() {
        let fs = BlobFs::open(Arc::new(MemoryRecordStore::new()), small_blocks())
            .await
            .unwrap();
        let meta = fs.create_node(&"f".into(), "f", NodeKind::File, None).await.unwrap();
        assert_eq!(meta.block_size, 4);

        let meta = fs
            .create_node_with_block_size(&"g".into(), "g", NodeKind::File, 16, None)
            .await
            .unwrap();
        assert_eq!(meta.block_size, 16);
    }

    #[tokio::test]
    async fn test_read_and_write_ranges() {
        let fs = BlobFs::open(Arc::new(MemoryRecordStore::new()), small_blocks())
            .await
            .unwrap();
        let id = NodeId::from("f");
        fs.create_node(&id, "f", NodeKind::File, None).await.unwrap();

        assert_eq!(fs.write_at(&id, 0, b"hello world").await.unwrap(), 11);
        assert_eq!(fs.write_at(&id, 6, b"blobs!").await.unwrap(), 6);
        assert_eq!(fs.stat(&id).await.unwrap().size, 12);

        assert_eq!(fs.read_range(&id, 0, 64).await.unwrap(), b"hello blobs!");
        assert_eq!(fs.read_range(&id, 6, 3).await.unwrap(), b"blo");
        assert!(fs.read_range(&id, 12, 3).await.unwrap().is_empty());
        assert!(matches!(
            fs.read_range(&id, 13, 1).await,
            Err(BlobFsError::InvalidPosition { .. })
        ));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let a = BlobFs::open(store.clone(), BlobFsConfig { namespace: "a".into(), block_size: 4 })
            .await
            .unwrap();
        let b = BlobFs::open(store, BlobFsConfig { namespace: "b".into(), block_size: 8 })
            .await
            .unwrap();

        a.create_node(&"f".into(), "f", NodeKind::File, None).await.unwrap();
        assert!(matches!(b.stat(&"f".into()).await, Err(BlobFsError::NotFound(_))));
        assert_eq!(b.settings().block_size, 8);
    }
}
