//! Migration 1: collections and indexes for decks and cards.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::ForgeDb;
use crate::collections::{CARD_VERSIONS, CARDS, CollectionSpec, DECK_VERSIONS, DECKS};
use crate::error::DatabaseError;

use super::Migration;

/// Created in order; dropped in reverse.
const COLLECTIONS: [CollectionSpec; 4] = [DECKS, CARDS, DECK_VERSIONS, CARD_VERSIONS];

pub struct InitialSetup;

#[async_trait]
impl Migration for InitialSetup {
    fn version(&self) -> u32 {
        1
    }

    fn name(&self) -> &str {
        "initial-setup"
    }

    fn description(&self) -> &str {
        "Create decks, cards and their version collections with indexes"
    }

    fn declared_at(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 7, 3, 52, 0)
            .single()
            .unwrap_or_default()
    }

    async fn up(&self, db: &ForgeDb) -> Result<(), DatabaseError> {
        for spec in &COLLECTIONS {
            db.ensure_collection(spec).await?;
        }
        Ok(())
    }

    async fn down(&self, db: &ForgeDb) -> Result<(), DatabaseError> {
        for spec in COLLECTIONS.iter().rev() {
            db.drop_collection(spec).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn up_and_down() {
        let db = ForgeDb::open_local(":memory:").await.unwrap();
        InitialSetup.up(&db).await.unwrap();
        for table in ["decks", "cards", "deck_versions", "card_versions"] {
            assert!(db.table_exists(table).await.unwrap(), "table '{table}' should exist");
        }

        let mut rows = db
            .conn()
            .query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
                (),
            )
            .await
            .unwrap();
        let count = rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap();
        // 8 deck + 7 card + 2 x 6 history
        assert_eq!(count, 27);
        drop(rows);

        InitialSetup.down(&db).await.unwrap();
        for table in ["decks", "cards", "deck_versions", "card_versions"] {
            assert!(!db.table_exists(table).await.unwrap());
        }
    }

    #[test]
    fn declared_at_is_fixed() {
        assert_eq!(
            InitialSetup.declared_at().to_rfc3339(),
            "2025-08-07T03:52:00+00:00"
        );
    }
}
