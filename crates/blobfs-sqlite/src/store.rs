//! `RecordStore` implementation over SQLite.

use async_trait::async_trait;
use blobfs_core::{Namespace, RecordStore, StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};

use crate::connection::Database;

/// Record store persisting every namespace in the `records` table.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run `f` on the blocking pool with the connection locked.
    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> crate::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock()?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::backend(format!("database task failed: {}", e)))?
        .map_err(StoreError::from)
    }
}

/// Exclusive upper bound for keys starting with `prefix`.
fn prefix_end(prefix: &str) -> String {
    let mut end = prefix.to_string();
    if let Some(last) = end.pop() {
        end.push(char::from_u32(last as u32 + 1).unwrap_or(char::MAX));
    }
    end
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, ns: &Namespace, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let k = ns.key(key);
        self.run(move |conn| {
            let value = conn
                .query_row("SELECT v FROM records WHERE k = ?", params![k], |row| {
                    row.get::<_, Vec<u8>>(0)
                })
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn put(&self, ns: &Namespace, key: &str, value: &[u8]) -> StoreResult<()> {
        let k = ns.key(key);
        let v = value.to_vec();
        self.run(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO records (k, v) VALUES (?, ?)",
                params![k, v],
            )?;
            Ok(())
        })
        .await
    }

    async fn update(&self, ns: &Namespace, key: &str, value: &[u8]) -> StoreResult<()> {
        let k = ns.key(key);
        let target = k.clone();
        let v = value.to_vec();
        let changed = self
            .run(move |conn| {
                Ok(conn.execute("UPDATE records SET v = ? WHERE k = ?", params![v, target])?)
            })
            .await?;
        if changed == 0 {
            return Err(StoreError::Missing { key: k });
        }
        Ok(())
    }

    async fn delete(&self, ns: &Namespace, key: &str) -> StoreResult<bool> {
        let k = ns.key(key);
        self.run(move |conn| Ok(conn.execute("DELETE FROM records WHERE k = ?", params![k])? > 0))
            .await
    }

    async fn keys(&self, ns: &Namespace) -> StoreResult<Vec<String>> {
        let ns = ns.clone();
        self.run(move |conn| {
            let mut stmt = conn.prepare("SELECT k FROM records WHERE k >= ? AND k < ? ORDER BY k")?;
            let rows = stmt.query_map(params![ns.prefix(), prefix_end(ns.prefix())], |row| {
                row.get::<_, String>(0)
            })?;

            let mut keys = Vec::new();
            for row in rows {
                if let Some(key) = ns.strip(&row?) {
                    keys.push(key.to_string());
                }
            }
            Ok(keys)
        })
        .await
    }

    async fn entries(&self, ns: &Namespace) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let ns = ns.clone();
        self.run(move |conn| {
            let mut stmt =
                conn.prepare("SELECT k, v FROM records WHERE k >= ? AND k < ? ORDER BY k")?;
            let rows = stmt.query_map(params![ns.prefix(), prefix_end(ns.prefix())], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?;

            let mut entries = Vec::new();
            for row in rows {
                let (k, v) = row?;
                if let Some(key) = ns.strip(&k) {
                    entries.push((key.to_string(), v));
                }
            }
            Ok(entries)
        })
        .await
    }
}
