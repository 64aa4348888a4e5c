//! Core type definitions for BlobFS

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque node identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Filesystem node types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::File => f.write_str("file"),
            NodeKind::Directory => f.write_str("directory"),
        }
    }
}

/// Persisted node metadata record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub name: String,
    /// Logical blob length in bytes.
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Fixed at creation.
    #[serde(rename = "blockSize")]
    pub block_size: u32,
    #[serde(rename = "creation")]
    pub created: DateTime<Utc>,
    #[serde(rename = "access")]
    pub accessed: DateTime<Utc>,
    pub parent: Option<NodeId>,
}

impl NodeMeta {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Number of blocks that may be persisted for the current size.
    pub fn block_count(&self) -> u64 {
        block_count(self.size, self.block_size)
    }
}

/// `ceil(size / block_size)`
pub fn block_count(size: u64, block_size: u32) -> u64 {
    size.div_ceil(u64::from(block_size))
}

/// Filesystem-wide settings persisted in the config namespace
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub block_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_count_rounds_up() {
        assert_eq!(block_count(0, 4), 0);
        assert_eq!(block_count(1, 4), 1);
        assert_eq!(block_count(4, 4), 1);
        assert_eq!(block_count(10, 4), 3);
    }

    #[test]
    fn test_node_kind_serialization() {
        assert_eq!(serde_json::to_string(&NodeKind::File).unwrap(), "\"file\"");
        let kind: NodeKind = serde_json::from_str("\"directory\"").unwrap();
        assert_eq!(kind, NodeKind::Directory);
    }

    #[test]
    fn test_node_meta_record_keys() {
        let now = Utc::now();
        let meta = NodeMeta {
            name: "f1".into(),
            size: 10,
            kind: NodeKind::File,
            block_size: 4,
            created: now,
            accessed: now,
            parent: Some(NodeId::from("0")),
        };

        let value = serde_json::to_value(&meta).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["access", "blockSize", "creation", "name", "parent", "size", "type"]);
        assert_eq!(value["type"], "file");
        assert_eq!(value["blockSize"], 4);
        assert_eq!(value["parent"], "0");

        let decoded: NodeMeta = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_node_id_is_transparent() {
        let id = NodeId::from("f1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"f1\"");
        assert_eq!(id.to_string(), "f1");
    }
}
