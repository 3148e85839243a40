//! # forge-db
//!
//! libSQL-backed versioned document store for ProxyForge.
//!
//! Each versioned entity type lives in two tables: a live collection with the
//! domain fields as JSON beside version-control metadata, and an append-only
//! history collection with one snapshot per version. The
//! [`VersionControlManager`](version_control::VersionControlManager) owns every
//! write to both; the [`MigrationManager`](migrations::MigrationManager)
//! sequences table and index setup.

pub mod collections;
pub mod error;
pub mod filter;
pub mod helpers;
pub mod indexes;
pub mod migrations;
pub mod repos;
pub mod retry;
pub mod service;
pub mod updates;
pub mod version_control;

#[cfg(test)]
mod test_support;

use std::path::Path;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle.
///
/// Wraps a libSQL database and its connection and provides ID generation.
pub struct ForgeDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl ForgeDb {
    /// Open a local database at `path`, or `:memory:`.
    ///
    /// Creates missing parent directories. Does not run migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory or database cannot be opened.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
                }
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        tracing::debug!(path, "database opened");
        Ok(Self { db, conn })
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"dck-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Whether a table named `name` exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the catalog query fails.
    pub async fn table_exists(&self, name: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }
}
