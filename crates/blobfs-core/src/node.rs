//! Node metadata records and the tree builder

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::block::BlockStore;
use crate::error::{BlobFsError, BlobFsResult};
use crate::store::{Namespace, RecordStore, SEPARATOR};
use crate::types::{NodeId, NodeKind, NodeMeta};

/// Access to the node metadata namespace
#[derive(Clone)]
pub struct NodeStore {
    store: Arc<dyn RecordStore>,
    nodes: Namespace,
    blobs: Namespace,
}

impl NodeStore {
    pub fn new(store: Arc<dyn RecordStore>, root: &Namespace) -> Self {
        Self {
            store,
            nodes: root.child("node"),
            blobs: root.child("blob"),
        }
    }

    /// Block access for one node.
    pub fn blocks(&self, id: &NodeId, block_size: u32) -> BlockStore {
        BlockStore::new(self.store.clone(), self.blobs.child(id.as_str()), id.clone(), block_size)
    }

    /// Create a node with `size = 0` linked under `parent`.
    pub async fn create_node(
        &self,
        id: &NodeId,
        name: &str,
        kind: NodeKind,
        block_size: u32,
        parent: Option<&NodeId>,
    ) -> BlobFsResult<NodeMeta> {
        if id.as_str().is_empty() || id.as_str().contains(SEPARATOR) {
            return Err(BlobFsError::InvalidArgument(format!("invalid node id {:?}", id.as_str())));
        }
        if block_size == 0 {
            return Err(BlobFsError::InvalidArgument("block size must be positive".into()));
        }
        if self.try_get_node(id).await?.is_some() {
            return Err(BlobFsError::AlreadyExists(id.clone()));
        }
        if let Some(parent_id) = parent {
            let parent_meta = self
                .try_get_node(parent_id)
                .await?
                .ok_or_else(|| BlobFsError::ParentNotFound(parent_id.clone()))?;
            if !parent_meta.is_dir() {
                return Err(BlobFsError::NotADirectory(parent_id.clone()));
            }
        }

        let now = Utc::now();
        let meta = NodeMeta {
            name: name.to_string(),
            size: 0,
            kind,
            block_size,
            created: now,
            accessed: now,
            parent: parent.cloned(),
        };
        self.store
            .put(&self.nodes, id.as_str(), &serde_json::to_vec(&meta)?)
            .await?;

        info!(node = %id, %kind, block_size, parent = ?parent.map(NodeId::as_str), "created node");
        Ok(meta)
    }

    pub async fn try_get_node(&self, id: &NodeId) -> BlobFsResult<Option<NodeMeta>> {
        match self.store.get(&self.nodes, id.as_str()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn get_node(&self, id: &NodeId) -> BlobFsResult<NodeMeta> {
        self.try_get_node(id)
            .await?
            .ok_or_else(|| BlobFsError::NotFound(id.clone()))
    }

    /// Persist a new logical size. Also refreshes the access time.
    pub async fn update_size(&self, id: &NodeId, size: u64) -> BlobFsResult<()> {
        self.modify(id, |meta| meta.size = size).await?;
        debug!(node = %id, size, "persisted size");
        Ok(())
    }

    /// Refresh the access time.
    pub async fn touch(&self, id: &NodeId) -> BlobFsResult<()> {
        self.modify(id, |_| {}).await
    }

    async fn modify<F>(&self, id: &NodeId, f: F) -> BlobFsResult<()>
    where
        F: FnOnce(&mut NodeMeta) + Send,
    {
        let mut meta = self.get_node(id).await?;
        f(&mut meta);
        meta.accessed = Utc::now();
        self.store
            .update(&self.nodes, id.as_str(), &serde_json::to_vec(&meta)?)
            .await?;
        Ok(())
    }

    /// Ids of the nodes whose parent is `id`.
    pub async fn children(&self, id: &NodeId) -> BlobFsResult<Vec<NodeId>> {
        let mut children = Vec::new();
        for (key, bytes) in self.store.entries(&self.nodes).await? {
            let meta: NodeMeta = serde_json::from_slice(&bytes)?;
            if meta.parent.as_ref() == Some(id) {
                children.push(NodeId::from(key));
            }
        }
        Ok(children)
    }

    /// Remove a node and its blocks. Directories must be empty.
    pub async fn remove_node(&self, id: &NodeId) -> BlobFsResult<()> {
        let meta = self.get_node(id).await?;
        if meta.is_dir() && !self.children(id).await?.is_empty() {
            return Err(BlobFsError::DirectoryNotEmpty(id.clone()));
        }

        let removed_blocks = self.blocks(id, meta.block_size).remove_all().await?;
        self.store.delete(&self.nodes, id.as_str()).await?;

        info!(node = %id, removed_blocks, "removed node");
        Ok(())
    }
}
