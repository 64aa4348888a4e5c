//! Database migration management.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::schema::SCHEMA_VERSION;

/// Database migration manager.
pub struct MigrationManager;

impl MigrationManager {
    /// Apply all pending migrations to the database.
    pub fn migrate(conn: &Connection) -> crate::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        let current = Self::current_version(conn)?;
        if let Some(version) = current {
            if version > SCHEMA_VERSION {
                return Err(crate::Error::migration(format!(
                    "database schema version {} is newer than supported version {}",
                    version, SCHEMA_VERSION
                )));
            }
        }

        if current.unwrap_or(0) < 1 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS records (
                    k TEXT PRIMARY KEY NOT NULL,
                    v BLOB NOT NULL
                ) WITHOUT ROWID;
                "#,
            )?;
            conn.execute(
                "INSERT OR IGNORE INTO schema_migrations (version) VALUES (?)",
                params![1],
            )?;
            info!(version = 1, "applied database migration");
        }

        Ok(())
    }

    /// Get the current schema version.
    pub fn current_version(conn: &Connection) -> crate::Result<Option<u32>> {
        let version = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", params![], |row| {
                row.get::<_, Option<u32>>(0)
            })
            .optional()?
            .flatten();

        Ok(version)
    }
}
