//! Collection declarations and their table DDL.
//!
//! Every versioned entity type owns two collections: a live table holding one
//! row per document and an append-only history table holding one row per
//! version.

use crate::indexes::{
    CARD_INDEXES, DECK_INDEXES, HISTORY_INDEXES, IndexSpec, LIVE_INDEXES, ensure_indexes,
};
use crate::ForgeDb;
use crate::error::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Live,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub kind: CollectionKind,
    pub indexes: &'static [IndexSpec],
}

pub const DECKS: CollectionSpec = CollectionSpec {
    name: "decks",
    kind: CollectionKind::Live,
    indexes: DECK_INDEXES,
};

pub const CARDS: CollectionSpec = CollectionSpec {
    name: "cards",
    kind: CollectionKind::Live,
    indexes: CARD_INDEXES,
};

pub const DECK_VERSIONS: CollectionSpec = CollectionSpec::history("deck_versions");

pub const CARD_VERSIONS: CollectionSpec = CollectionSpec::history("card_versions");

impl CollectionSpec {
    /// A live collection. `decks` and `cards` resolve to their declared indexes.
    #[must_use]
    pub fn live(name: &'static str) -> Self {
        match name {
            "decks" => DECKS,
            "cards" => CARDS,
            _ => Self {
                name,
                kind: CollectionKind::Live,
                indexes: LIVE_INDEXES,
            },
        }
    }

    #[must_use]
    pub const fn history(name: &'static str) -> Self {
        Self {
            name,
            kind: CollectionKind::History,
            indexes: HISTORY_INDEXES,
        }
    }

    #[must_use]
    pub fn create_sql(&self) -> String {
        let name = self.name;
        match self.kind {
            CollectionKind::Live => format!(
                "CREATE TABLE IF NOT EXISTS {name} (
                    id TEXT PRIMARY KEY,
                    fields TEXT NOT NULL CHECK (json_valid(fields)),
                    current_version INTEGER NOT NULL CHECK (current_version >= 1),
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )"
            ),
            CollectionKind::History => format!(
                "CREATE TABLE IF NOT EXISTS {name} (
                    id TEXT PRIMARY KEY,
                    document_id TEXT NOT NULL,
                    version INTEGER NOT NULL CHECK (version >= 1),
                    snapshot TEXT NOT NULL CHECK (json_valid(snapshot)),
                    timestamp TEXT NOT NULL,
                    changed_by TEXT NOT NULL,
                    change_reason TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )"
            ),
        }
    }

    #[must_use]
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }
}

impl ForgeDb {
    /// Create the table for `spec` and all of its indexes.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::WriteFailure` if the table or an index cannot be created.
    pub async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), DatabaseError> {
        self.conn()
            .execute(&spec.create_sql(), ())
            .await
            .map_err(|e| DatabaseError::WriteFailure(format!("create {}: {e}", spec.name)))?;
        ensure_indexes(self, spec.name, spec.indexes).await?;
        tracing::debug!(collection = spec.name, "collection ensured");
        Ok(())
    }

    /// Drop the table for `spec` (its indexes go with it).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::WriteFailure` if the drop fails.
    pub async fn drop_collection(&self, spec: &CollectionSpec) -> Result<(), DatabaseError> {
        self.conn()
            .execute(&spec.drop_sql(), ())
            .await
            .map_err(|e| DatabaseError::WriteFailure(format!("drop {}: {e}", spec.name)))?;
        Ok(())
    }
}
