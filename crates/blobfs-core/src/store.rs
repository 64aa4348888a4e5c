//! Keyed record store contract and the in-memory implementation

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

/// Separator between namespace segments in a rendered key.
pub const SEPARATOR: char = ':';

/// Errors surfaced by a record store backend
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("record not found: {key}")]
    Missing { key: String },
    #[error("backend error: {0}")]
    Backend(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend(message.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Hierarchical key prefix, rendered as `seg1:seg2:...:`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    pub fn root(name: &str) -> Self {
        Self {
            prefix: format!("{name}{SEPARATOR}"),
        }
    }

    pub fn child(&self, segment: &str) -> Self {
        Self {
            prefix: format!("{}{segment}{SEPARATOR}", self.prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full store key for `key` inside this namespace.
    pub fn key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Inverse of [`Namespace::key`] for keys stored directly in this
    /// namespace. Keys of nested namespaces yield `None`.
    pub fn strip<'a>(&self, full_key: &'a str) -> Option<&'a str> {
        full_key
            .strip_prefix(self.prefix.as_str())
            .filter(|rest| !rest.is_empty() && !rest.contains(SEPARATOR))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}

/// Keyed get/put/update primitive over opaque byte values.
///
/// Per-key operations are expected to be atomic. Nothing in this crate
/// relies on atomicity across keys.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, ns: &Namespace, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Insert or replace.
    async fn put(&self, ns: &Namespace, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Replace an existing record; `StoreError::Missing` if there is none.
    async fn update(&self, ns: &Namespace, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Returns whether a record was removed.
    async fn delete(&self, ns: &Namespace, key: &str) -> StoreResult<bool>;

    /// Keys stored directly in `ns`, without the prefix, in key order.
    async fn keys(&self, ns: &Namespace) -> StoreResult<Vec<String>>;

    /// Like [`RecordStore::keys`], with each record's value.
    async fn entries(&self, ns: &Namespace) -> StoreResult<Vec<(String, Vec<u8>)>>;
}

/// In-memory record store
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<String, Vec<u8>>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` and `entries` calls served.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of successful `put`, `update` and `delete` calls.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.records
            .lock()
            .map_err(|e| StoreError::backend(format!("failed to acquire store lock: {e}")))
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, ns: &Namespace, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.records()?.get(&ns.key(key)).cloned())
    }

    async fn put(&self, ns: &Namespace, key: &str, value: &[u8]) -> StoreResult<()> {
        self.records()?.insert(ns.key(key), value.to_vec());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn update(&self, ns: &Namespace, key: &str, value: &[u8]) -> StoreResult<()> {
        let full_key = ns.key(key);
        let mut records = self.records()?;
        let record = records
            .get_mut(&full_key)
            .ok_or_else(|| StoreError::Missing { key: full_key.clone() })?;
        *record = value.to_vec();
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete(&self, ns: &Namespace, key: &str) -> StoreResult<bool> {
        let removed = self.records()?.remove(&ns.key(key)).is_some();
        if removed {
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    async fn keys(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        let records = self.records()?;
        Ok(records
            .range(ns.prefix().to_string()..)
            .take_while(|(k, _)| k.starts_with(ns.prefix()))
            .filter_map(|(k, _)| ns.strip(k).map(str::to_string))
            .collect())
    }

    async fn entries(&self, ns: &Namespace) -> StoreResult<Vec<(String, Vec<u8>)>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let records = self.records()?;
        Ok(records
            .range(ns.prefix().to_string()..)
            .take_while(|(k, _)| k.starts_with(ns.prefix()))
            .filter_map(|(k, v)| ns.strip(k).map(|key| (key.to_string(), v.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_rendering() {
        let root = Namespace::root("blobfs");
        let blob = root.child("blob").child("f1");
        assert_eq!(blob.prefix(), "blobfs:blob:f1:");
        assert_eq!(blob.key("0"), "blobfs:blob:f1:0");
        assert_eq!(blob.strip("blobfs:blob:f1:7"), Some("7"));
        assert_eq!(root.child("blob").strip("blobfs:blob:f1:7"), None);
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryRecordStore::new();
        let ns = Namespace::root("t").child("node");

        assert_eq!(store.get(&ns, "a").await.unwrap(), None);
        store.put(&ns, "a", b"hello").await.unwrap();
        assert_eq!(store.get(&ns, "a").await.unwrap().as_deref(), Some(&b"hello"[..]));

        store.update(&ns, "a", b"world").await.unwrap();
        assert_eq!(store.get(&ns, "a").await.unwrap().as_deref(), Some(&b"world"[..]));

        assert!(store.delete(&ns, "a").await.unwrap());
        assert!(!store.delete(&ns, "a").await.unwrap());
        assert_eq!(store.writes(), 3);
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let store = MemoryRecordStore::new();
        let ns = Namespace::root("t");
        let err = store.update(&ns, "ghost", b"x").await.unwrap_err();
        assert!(matches!(err, StoreError::Missing { key } if key == "t:ghost"));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_keys_only_lists_direct_children() {
        let store = MemoryRecordStore::new();
        let blob = Namespace::root("t").child("blob");
        let f1 = blob.child("f1");
        store.put(&f1, "0", b"x").await.unwrap();
        store.put(&f1, "1", b"y").await.unwrap();
        store.put(&blob.child("f2"), "0", b"z").await.unwrap();

        assert_eq!(store.keys(&f1).await.unwrap(), vec!["0", "1"]);
        assert!(store.keys(&blob).await.unwrap().is_empty());

        let entries = store.entries(&f1).await.unwrap();
        assert_eq!(entries, vec![("0".to_string(), b"x".to_vec()), ("1".to_string(), b"y".to_vec())]);
        assert!(store.entries(&blob).await.unwrap().is_empty());
    }
}
