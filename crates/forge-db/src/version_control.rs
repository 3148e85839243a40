//! Version Control Manager.
//!
//! Owns every write to a versioned entity type's live and history collections.
//!
//! History convention: the record at version `N` holds the domain fields as
//! they are immediately after the mutation that produced version `N`, so
//! record 1 is the creation snapshot and the newest record always equals the
//! live document's fields.
//!
//! Write order for every mutation is live document first, then the history
//! record. Both are fully validated before either is written. `update` and
//! `rollback` advance the live document with a conditional write on the
//! version they read; if another writer got there first the cycle is retried
//! per [`ConflictRetry`] and finally reported as [`DatabaseError::Conflict`].
//! The two writes are not transactional: a crash between them leaves a live
//! document whose `current_version` has no history record.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use forge_core::version::{
    Document, HistoryOptions, INITIAL_VERSION_REASON, RollbackOptions, VersionChange,
    VersionHistory, VersionRecord, Versioned, VersionedUpdateOptions, rollback_reason,
};
use forge_schema::SchemaRegistry;

use crate::ForgeDb;
use crate::collections::CollectionSpec;
use crate::error::DatabaseError;
use crate::filter::{DocumentFilter, ListOrder};
use crate::helpers::{format_datetime, get_opt_string, get_u32, now, parse_datetime, parse_json};
use crate::retry::ConflictRetry;

const LIVE_COLUMNS: &str = "id, fields, current_version, created_at, updated_at";
const HISTORY_COLUMNS: &str = "id, document_id, version, snapshot, timestamp, changed_by, change_reason, created_at, updated_at";

/// Metadata keys a partial update may not touch.
const RESERVED_KEYS: [&str; 4] = ["id", "current_version", "created_at", "updated_at"];

fn row_to_document<F: Versioned>(row: &libsql::Row) -> Result<Document<F>, DatabaseError> {
    Ok(Document {
        id: row.get::<String>(0)?,
        fields: parse_json(&row.get::<String>(1)?)?,
        current_version: get_u32(row, 2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
        updated_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

fn row_to_record<F: Versioned>(row: &libsql::Row) -> Result<VersionRecord<F>, DatabaseError> {
    Ok(VersionRecord {
        id: row.get::<String>(0)?,
        document_id: row.get::<String>(1)?,
        version: get_u32(row, 2)?,
        snapshot: parse_json(&row.get::<String>(3)?)?,
        timestamp: parse_datetime(&row.get::<String>(4)?)?,
        changed_by: row.get::<String>(5)?,
        change_reason: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

fn write_failure(table: &str, e: &libsql::Error) -> DatabaseError {
    DatabaseError::WriteFailure(format!("{table}: {e}"))
}

fn require_actor(actor_id: &str) -> Result<(), DatabaseError> {
    if actor_id.trim().is_empty() {
        return Err(DatabaseError::Validation("actor_id must not be empty".into()));
    }
    Ok(())
}

/// A caller-supplied change reason, or `None` when it is absent or blank.
fn given_reason(reason: Option<&str>) -> Option<String> {
    reason
        .filter(|r| !r.trim().is_empty())
        .map(ToString::to_string)
}

/// Serialize a partial update and check it is a JSON object of domain keys.
fn partial_object<U: Serialize + ?Sized>(changes: &U) -> Result<Map<String, Value>, DatabaseError> {
    match serde_json::to_value(changes)? {
        Value::Object(map) => {
            if let Some(key) = map.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
                return Err(DatabaseError::Validation(format!(
                    "'{key}' is managed by version control and cannot be updated"
                )));
            }
            Ok(map)
        }
        other => Err(DatabaseError::Validation(format!(
            "partial update must be a JSON object, got {other}"
        ))),
    }
}

/// Versioned create/update/rollback/history over one entity type.
///
/// Borrowed from a [`ForgeService`](crate::service::ForgeService) via
/// `decks()`/`cards()`, or built directly for types defined elsewhere.
pub struct VersionControlManager<'a, F> {
    db: &'a ForgeDb,
    schema: &'a SchemaRegistry,
    retry: &'a ConflictRetry,
    _fields: PhantomData<fn() -> F>,
}

impl<'a, F: Versioned> VersionControlManager<'a, F> {
    /// `schema` must contain `F::SCHEMA` and `F::VERSION_SCHEMA`.
    #[must_use]
    pub const fn new(db: &'a ForgeDb, schema: &'a SchemaRegistry, retry: &'a ConflictRetry) -> Self {
        Self {
            db,
            schema,
            retry,
            _fields: PhantomData,
        }
    }

    /// Create both collections with their indexes. Built-in types get theirs
    /// from the initial migration; this is for types registered later.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::WriteFailure` if a table or index cannot be created.
    pub async fn ensure_collections(&self) -> Result<(), DatabaseError> {
        self.db
            .ensure_collection(&CollectionSpec::live(F::COLLECTION))
            .await?;
        self.db
            .ensure_collection(&CollectionSpec::history(F::HISTORY_COLLECTION))
            .await
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Insert a new document at version 1 and its creation record.
    ///
    /// The change reason defaults to `"Initial version"`.
    ///
    /// # Errors
    ///
    /// `Validation` if the fields fail the schema (nothing written),
    /// `WriteFailure` if either write is rejected.
    pub async fn create(
        &self,
        fields: F,
        options: &VersionedUpdateOptions,
    ) -> Result<Document<F>, DatabaseError> {
        require_actor(&options.actor_id)?;
        let (fields, value) = self.validate_fields(serde_json::to_value(&fields)?)?;

        let id = self.db.generate_id(F::ID_PREFIX).await?;
        let now = now();
        let reason = given_reason(options.change_reason.as_deref())
            .unwrap_or_else(|| INITIAL_VERSION_REASON.to_string());
        let record = self
            .prepare_record(&id, 1, &fields, now, &options.actor_id, Some(reason))
            .await?;

        let ts = format_datetime(&now);
        self.db
            .conn()
            .execute(
                &format!(
                    "INSERT INTO {} ({LIVE_COLUMNS}) VALUES (?1, ?2, 1, ?3, ?3)",
                    F::COLLECTION
                ),
                libsql::params![id.as_str(), value.to_string(), ts.as_str()],
            )
            .await
            .map_err(|e| write_failure(F::COLLECTION, &e))?;

        self.insert_record(&record).await?;
        tracing::debug!(collection = F::COLLECTION, id = %id, version = 1, "document created");

        Ok(Document {
            id,
            fields,
            current_version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update (`$set` of top-level keys) to the one document
    /// matching `filter`, producing the next version.
    ///
    /// `changes` must serialize to a JSON object. The merged field set is
    /// validated as a whole before anything is written.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches (no history written), `Validation` for a
    /// malformed patch or merged fields, `WriteFailure` if a write is rejected,
    /// `Conflict` if every attempt lost the race to another writer.
    pub async fn update<U: Serialize + ?Sized>(
        &self,
        filter: &DocumentFilter,
        changes: &U,
        options: &VersionedUpdateOptions,
    ) -> Result<Document<F>, DatabaseError> {
        require_actor(&options.actor_id)?;
        let patch = partial_object(changes)?;
        self.reject_unknown_keys(&patch)?;

        let mut conflict = None;
        for attempt in 1..=self.retry.attempts() {
            if attempt > 1 {
                tokio::time::sleep(self.retry.delay_for(attempt - 1)).await;
            }

            let current = self.find_one_required(filter).await?;
            let mut merged = serde_json::to_value(&current.fields)?;
            if let Value::Object(map) = &mut merged {
                map.extend(patch.clone());
            }
            let (fields, value) = self.validate_fields(merged)?;

            let advanced = self
                .advance(
                    &current,
                    fields,
                    &value,
                    &options.actor_id,
                    given_reason(options.change_reason.as_deref()),
                )
                .await?;
            match advanced {
                Some(doc) => return Ok(doc),
                None => conflict = Some(self.conflict_seen(&current, attempt)),
            }
        }
        Err(self.conflict_error(conflict))
    }

    /// Restore the snapshot of `target_version` as a new forward version.
    ///
    /// `current_version` always increases; it never returns to the target.
    /// The change reason defaults to `"Rollback to version {target}"`.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches, `VersionNotFound` if the target has no
    /// history record, `Validation` if the restored snapshot no longer passes
    /// the schema, `WriteFailure` or `Conflict` as for [`Self::update`].
    pub async fn rollback(
        &self,
        filter: &DocumentFilter,
        options: &RollbackOptions,
    ) -> Result<Document<F>, DatabaseError> {
        require_actor(&options.actor_id)?;
        let reason = given_reason(options.change_reason.as_deref())
            .unwrap_or_else(|| rollback_reason(options.target_version));

        let mut conflict = None;
        for attempt in 1..=self.retry.attempts() {
            if attempt > 1 {
                tokio::time::sleep(self.retry.delay_for(attempt - 1)).await;
            }

            let current = self.find_one_required(filter).await?;
            let target = self
                .get_version(&current.id, options.target_version)
                .await?;
            let (fields, value) = self.validate_fields(serde_json::to_value(&target.snapshot)?)?;

            let advanced = self
                .advance(&current, fields, &value, &options.actor_id, Some(reason.clone()))
                .await?;
            match advanced {
                Some(doc) => {
                    tracing::debug!(
                        collection = F::COLLECTION,
                        id = %doc.id,
                        target = options.target_version,
                        version = doc.current_version,
                        "document rolled back"
                    );
                    return Ok(doc);
                }
                None => conflict = Some(self.conflict_seen(&current, attempt)),
            }
        }
        Err(self.conflict_error(conflict))
    }

    /// Remove the live document matching `filter`. Its history stays.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches, `WriteFailure` if the delete is rejected.
    pub async fn delete(&self, filter: &DocumentFilter) -> Result<Document<F>, DatabaseError> {
        let doc = self.find_one_required(filter).await?;
        self.db
            .conn()
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", F::COLLECTION),
                [doc.id.as_str()],
            )
            .await
            .map_err(|e| write_failure(F::COLLECTION, &e))?;
        tracing::debug!(collection = F::COLLECTION, id = %doc.id, "document deleted");
        Ok(doc)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// History records in ascending version order, windowed and paged, with a
    /// diff for every adjacent pair returned.
    ///
    /// `total` counts records inside the version window and ignores
    /// `skip`/`limit`. A `limit` of `None` or `Some(0)` returns everything.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails or a stored row is malformed.
    pub async fn get_history(
        &self,
        document_id: &str,
        options: &HistoryOptions,
    ) -> Result<VersionHistory<F>, DatabaseError> {
        let table = F::HISTORY_COLLECTION;
        let from = i64::from(options.from_version.unwrap_or(1));
        let to = options.to_version.map_or(i64::MAX, i64::from);

        let mut rows = self
            .db
            .conn()
            .query(
                &format!(
                    "SELECT COUNT(*) FROM {table} WHERE document_id = ?1 AND version BETWEEN ?2 AND ?3"
                ),
                libsql::params![document_id, from, to],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let total = u64::try_from(row.get::<i64>(0)?)
            .map_err(|e| DatabaseError::Query(format!("negative count: {e}")))?;

        let limit = match options.limit {
            None | Some(0) => -1,
            Some(n) => i64::from(n),
        };
        let offset = i64::from(options.skip.unwrap_or(0));
        let mut rows = self
            .db
            .conn()
            .query(
                &format!(
                    "SELECT {HISTORY_COLUMNS} FROM {table}
                     WHERE document_id = ?1 AND version BETWEEN ?2 AND ?3
                     ORDER BY version ASC LIMIT ?4 OFFSET ?5"
                ),
                libsql::params![document_id, from, to, limit, offset],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record::<F>(&row)?);
        }

        let changes = records
            .windows(2)
            .map(|pair| VersionChange::between(&pair[0], &pair[1]))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VersionHistory {
            document_id: document_id.to_string(),
            changes,
            total,
        })
    }

    /// The one history record of `document_id` at `version`.
    ///
    /// # Errors
    ///
    /// `VersionNotFound` if no such record exists.
    pub async fn get_version(
        &self,
        document_id: &str,
        version: u32,
    ) -> Result<VersionRecord<F>, DatabaseError> {
        let mut rows = self
            .db
            .conn()
            .query(
                &format!(
                    "SELECT {HISTORY_COLUMNS} FROM {} WHERE document_id = ?1 AND version = ?2",
                    F::HISTORY_COLLECTION
                ),
                libsql::params![document_id, i64::from(version)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_record(&row),
            None => Err(DatabaseError::VersionNotFound {
                document_id: document_id.to_string(),
                version,
            }),
        }
    }

    /// The first document (by `created_at`) matching `filter`, if any.
    ///
    /// # Errors
    ///
    /// `Validation` for an invalid filter path; otherwise query errors.
    pub async fn find_one(&self, filter: &DocumentFilter) -> Result<Option<Document<F>>, DatabaseError> {
        let docs = self.list(filter, ListOrder::Created, Some(1)).await?;
        Ok(docs.into_iter().next())
    }

    /// # Errors
    ///
    /// `NotFound` if no document has this id.
    pub async fn get(&self, id: &str) -> Result<Document<F>, DatabaseError> {
        self.find_one_required(&DocumentFilter::by_id(id)).await
    }

    /// Documents matching `filter` in `order`, at most `limit` (`None` or 0 for all).
    ///
    /// # Errors
    ///
    /// `Validation` for an invalid filter path; otherwise query errors.
    pub async fn list(
        &self,
        filter: &DocumentFilter,
        order: ListOrder,
        limit: Option<u32>,
    ) -> Result<Vec<Document<F>>, DatabaseError> {
        let (condition, mut params) = filter.to_sql(1)?;
        let limit_idx = params.len() + 1;
        params.push(libsql::Value::Integer(match limit {
            None | Some(0) => -1,
            Some(n) => i64::from(n),
        }));

        let sql = format!(
            "SELECT {LIVE_COLUMNS} FROM {} WHERE {condition} ORDER BY {} LIMIT ?{limit_idx}",
            F::COLLECTION,
            order.to_sql()
        );
        let mut rows = self
            .db
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut docs = Vec::new();
        while let Some(row) = rows.next().await? {
            docs.push(row_to_document::<F>(&row)?);
        }
        Ok(docs)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn find_one_required(&self, filter: &DocumentFilter) -> Result<Document<F>, DatabaseError> {
        self.find_one(filter)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                collection: F::COLLECTION.to_string(),
                filter: filter.to_string(),
            })
    }

    /// Reject patch keys that are not top-level properties of `F::SCHEMA`.
    /// Skipped when the schema does not list its properties.
    fn reject_unknown_keys(&self, patch: &Map<String, Value>) -> Result<(), DatabaseError> {
        let Some(properties) = self
            .schema
            .get(F::SCHEMA)
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object)
        else {
            return Ok(());
        };
        match patch.keys().find(|key| !properties.contains_key(*key)) {
            Some(key) => Err(DatabaseError::Validation(format!(
                "'{key}' is not a field of {}",
                F::SCHEMA
            ))),
            None => Ok(()),
        }
    }

    /// Validate a complete field set, returning it typed and normalized.
    fn validate_fields(&self, value: Value) -> Result<(F, Value), DatabaseError> {
        self.schema.validate(F::SCHEMA, &value)?;
        let fields: F = serde_json::from_value(value)
            .map_err(|e| DatabaseError::Validation(format!("{}: {e}", F::SCHEMA)))?;
        let normalized = serde_json::to_value(&fields)?;
        Ok((fields, normalized))
    }

    /// Build and validate a history record without writing it.
    async fn prepare_record(
        &self,
        document_id: &str,
        version: u32,
        snapshot: &F,
        at: DateTime<Utc>,
        actor_id: &str,
        change_reason: Option<String>,
    ) -> Result<VersionRecord<F>, DatabaseError> {
        let record = VersionRecord {
            id: self.db.generate_id(F::VERSION_ID_PREFIX).await?,
            document_id: document_id.to_string(),
            version,
            snapshot: snapshot.clone(),
            timestamp: at,
            changed_by: actor_id.to_string(),
            change_reason,
            created_at: at,
            updated_at: at,
        };
        self.schema
            .validate(F::VERSION_SCHEMA, &serde_json::to_value(&record)?)?;
        Ok(record)
    }

    async fn insert_record(&self, record: &VersionRecord<F>) -> Result<(), DatabaseError> {
        let snapshot = serde_json::to_string(&record.snapshot)?;
        let ts = format_datetime(&record.timestamp);
        self.db
            .conn()
            .execute(
                &format!(
                    "INSERT INTO {} ({HISTORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    F::HISTORY_COLLECTION
                ),
                libsql::params![
                    record.id.as_str(),
                    record.document_id.as_str(),
                    i64::from(record.version),
                    snapshot,
                    ts.as_str(),
                    record.changed_by.as_str(),
                    record.change_reason.as_deref(),
                    format_datetime(&record.created_at),
                    format_datetime(&record.updated_at)
                ],
            )
            .await
            .map_err(|e| write_failure(F::HISTORY_COLLECTION, &e))?;
        Ok(())
    }

    /// Move `current` to the next version with `fields`, then append its
    /// history record. Returns `None` when another writer advanced the
    /// document since it was read (nothing is written in that case).
    async fn advance(
        &self,
        current: &Document<F>,
        fields: F,
        value: &Value,
        actor_id: &str,
        change_reason: Option<String>,
    ) -> Result<Option<Document<F>>, DatabaseError> {
        let next = current.current_version + 1;
        let now = now();
        let record = self
            .prepare_record(&current.id, next, &fields, now, actor_id, change_reason)
            .await?;

        let changed = self
            .db
            .conn()
            .execute(
                &format!(
                    "UPDATE {} SET fields = ?1, current_version = ?2, updated_at = ?3
                     WHERE id = ?4 AND current_version = ?5",
                    F::COLLECTION
                ),
                libsql::params![
                    value.to_string(),
                    i64::from(next),
                    format_datetime(&now),
                    current.id.as_str(),
                    i64::from(current.current_version)
                ],
            )
            .await
            .map_err(|e| write_failure(F::COLLECTION, &e))?;
        if changed == 0 {
            return Ok(None);
        }

        self.insert_record(&record).await?;
        tracing::debug!(collection = F::COLLECTION, id = %current.id, version = next, "document advanced");

        Ok(Some(Document {
            id: current.id.clone(),
            fields,
            current_version: next,
            created_at: current.created_at,
            updated_at: now,
        }))
    }

    fn conflict_seen(&self, current: &Document<F>, attempt: u32) -> (String, u32) {
        tracing::warn!(
            collection = F::COLLECTION,
            id = %current.id,
            expected_version = current.current_version,
            attempt,
            max_attempts = self.retry.attempts(),
            "document advanced by another writer"
        );
        (current.id.clone(), current.current_version)
    }

    fn conflict_error(&self, seen: Option<(String, u32)>) -> DatabaseError {
        let (document_id, expected_version) = seen.unwrap_or_default();
        DatabaseError::Conflict {
            collection: F::COLLECTION.to_string(),
            document_id,
            expected_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{deck_fields, test_service};
    use forge_core::entities::DeckFields;
    use forge_core::enums::DeckStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn by(actor: &str) -> VersionedUpdateOptions {
        VersionedUpdateOptions::by(actor)
    }

    #[tokio::test]
    async fn create_writes_version_one() {
        let svc = test_service().await;
        let doc = svc.decks().create(deck_fields("Bolt"), &by("u1")).await.unwrap();

        assert!(doc.id.starts_with("dck-"));
        assert_eq!(doc.current_version, 1);
        assert_eq!(doc.created_at, doc.updated_at);

        let record = svc.decks().get_version(&doc.id, 1).await.unwrap();
        assert!(record.id.starts_with("dkv-"));
        assert_eq!(record.snapshot, doc.fields);
        assert_eq!(record.changed_by, "u1");
        assert_eq!(record.change_reason.as_deref(), Some("Initial version"));
        assert_eq!(svc.decks().get(&doc.id).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn create_keeps_explicit_reason() {
        let svc = test_service().await;
        let doc = svc
            .decks()
            .create(deck_fields("Bolt"), &by("u1").reason("imported"))
            .await
            .unwrap();
        let record = svc.decks().get_version(&doc.id, 1).await.unwrap();
        assert_eq!(record.change_reason.as_deref(), Some("imported"));
    }

    #[tokio::test]
    async fn blank_reasons_fall_back_to_defaults() {
        let svc = test_service().await;
        let doc = svc
            .decks()
            .create(deck_fields("Bolt"), &by("u1").reason(""))
            .await
            .unwrap();
        let record = svc.decks().get_version(&doc.id, 1).await.unwrap();
        assert_eq!(record.change_reason.as_deref(), Some("Initial version"));

        let filter = DocumentFilter::by_id(&doc.id);
        svc.decks()
            .update(&filter, &json!({"name": "Bolt2"}), &by("u1").reason("  "))
            .await
            .unwrap();
        assert!(svc.decks().get_version(&doc.id, 2).await.unwrap().change_reason.is_none());

        let rolled = svc
            .decks()
            .rollback(&filter, &RollbackOptions::to(1, "u1").reason(""))
            .await
            .unwrap();
        let record = svc.decks().get_version(&doc.id, rolled.current_version).await.unwrap();
        assert_eq!(record.change_reason.as_deref(), Some("Rollback to version 1"));
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields_without_writing() {
        let svc = test_service().await;
        let err = svc.decks().create(deck_fields(""), &by("u1")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)), "got {err:?}");

        let all = svc
            .decks()
            .list(&DocumentFilter::new(), ListOrder::Created, None)
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn empty_actor_is_rejected() {
        let svc = test_service().await;
        let err = svc.decks().create(deck_fields("Bolt"), &by(" ")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn update_merges_top_level_keys() {
        let svc = test_service().await;
        let doc = svc.decks().create(deck_fields("Bolt"), &by("u1")).await.unwrap();

        let updated = svc
            .decks()
            .update(
                &DocumentFilter::by_id(&doc.id),
                &json!({"name": "Bolt2", "is_public": true}),
                &by("u2").reason("rename"),
            )
            .await
            .unwrap();

        assert_eq!(updated.current_version, 2);
        assert_eq!(updated.fields.name, "Bolt2");
        assert!(updated.fields.is_public);
        assert_eq!(updated.fields.theme, doc.fields.theme);
        assert_eq!(updated.created_at, doc.created_at);
        assert!(updated.updated_at >= doc.updated_at);

        let record = svc.decks().get_version(&doc.id, 2).await.unwrap();
        assert_eq!(record.snapshot, updated.fields);
        assert_eq!(record.changed_by, "u2");
        assert_eq!(record.change_reason.as_deref(), Some("rename"));
    }

    #[tokio::test]
    async fn update_without_reason_stores_none() {
        let svc = test_service().await;
        let doc = svc.decks().create(deck_fields("Bolt"), &by("u1")).await.unwrap();
        svc.decks()
            .update(&DocumentFilter::by_id(&doc.id), &json!({"name": "B"}), &by("u1"))
            .await
            .unwrap();
        let record = svc.decks().get_version(&doc.id, 2).await.unwrap();
        assert!(record.change_reason.is_none());
    }

    #[tokio::test]
    async fn update_rejects_non_object_and_reserved_keys() {
        let svc = test_service().await;
        let doc = svc.decks().create(deck_fields("Bolt"), &by("u1")).await.unwrap();
        let filter = DocumentFilter::by_id(&doc.id);

        let err = svc.decks().update(&filter, &json!(["name"]), &by("u1")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let err = svc
            .decks()
            .update(&filter, &json!({"current_version": 9}), &by("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(ref m) if m.contains("current_version")));

        assert_eq!(svc.decks().get(&doc.id).await.unwrap().current_version, 1);
    }

    #[tokio::test]
    async fn update_rejects_unknown_keys_without_writing() {
        let svc = test_service().await;
        let doc = svc.decks().create(deck_fields("Bolt"), &by("u1")).await.unwrap();
        let filter = DocumentFilter::by_id(&doc.id);

        let err = svc
            .decks()
            .update(&filter, &json!({"nmae": "Typo"}), &by("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(ref m) if m.contains("nmae")), "got {err:?}");

        let mut theme = serde_json::to_value(&doc.fields.theme).unwrap();
        theme["colour"] = json!("blue");
        let err = svc
            .decks()
            .update(&filter, &json!({"theme": theme}), &by("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)), "got {err:?}");

        assert_eq!(svc.decks().get(&doc.id).await.unwrap().current_version, 1);
        let history = svc.decks().get_history(&doc.id, &HistoryOptions::default()).await.unwrap();
        assert_eq!(history.total, 1);
    }

    #[tokio::test]
    async fn update_validates_merged_fields() {
        let svc = test_service().await;
        let doc = svc.decks().create(deck_fields("Bolt"), &by("u1")).await.unwrap();

        let err = svc
            .decks()
            .update(&DocumentFilter::by_id(&doc.id), &json!({"status": "exploded"}), &by("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let history = svc.decks().get_history(&doc.id, &HistoryOptions::default()).await.unwrap();
        assert_eq!(history.total, 1);
    }

    #[tokio::test]
    async fn update_by_field_filter() {
        let svc = test_service().await;
        let first = svc.decks().create(deck_fields("Alpha"), &by("u1")).await.unwrap();
        svc.decks().create(deck_fields("Beta"), &by("u1")).await.unwrap();

        let updated = svc
            .decks()
            .update(
                &DocumentFilter::new().field("name", "Alpha"),
                &json!({"status": "published"}),
                &by("u1"),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.fields.status, DeckStatus::Published);
    }

    #[tokio::test]
    async fn stale_writer_is_detected() {
        let svc = test_service().await;
        let manager = svc.decks();
        let doc = manager.create(deck_fields("Bolt"), &by("u1")).await.unwrap();
        manager
            .update(&DocumentFilter::by_id(&doc.id), &json!({"name": "Fresh"}), &by("u1"))
            .await
            .unwrap();

        // `doc` still claims version 1; the conditional write must miss.
        let mut stale: DeckFields = doc.fields.clone();
        stale.name = "Stale".into();
        let value = serde_json::to_value(&stale).unwrap();
        let result = manager.advance(&doc, stale, &value, "u2", None).await.unwrap();
        assert!(result.is_none());

        let live = manager.get(&doc.id).await.unwrap();
        assert_eq!(live.current_version, 2);
        assert_eq!(live.fields.name, "Fresh");
        let history = manager.get_history(&doc.id, &HistoryOptions::default()).await.unwrap();
        assert_eq!(history.total, 2);
    }

    #[tokio::test]
    async fn conflict_error_names_document() {
        let svc = test_service().await;
        let manager = svc.decks();
        let err = manager.conflict_error(Some(("dck-00000001".into(), 4)));
        assert!(matches!(
            err,
            DatabaseError::Conflict { ref collection, ref document_id, expected_version: 4 }
                if collection == "decks" && document_id == "dck-00000001"
        ));
    }

    #[tokio::test]
    async fn delete_keeps_history() {
        let svc = test_service().await;
        let doc = svc.decks().create(deck_fields("Bolt"), &by("u1")).await.unwrap();

        let deleted = svc.decks().delete(&DocumentFilter::by_id(&doc.id)).await.unwrap();
        assert_eq!(deleted.id, doc.id);
        assert!(matches!(
            svc.decks().get(&doc.id).await.unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
        assert_eq!(svc.decks().get_version(&doc.id, 1).await.unwrap().snapshot, doc.fields);
    }

    #[tokio::test]
    async fn list_orders_and_limits() {
        let svc = test_service().await;
        for name in ["One", "Two", "Three"] {
            svc.decks().create(deck_fields(name), &by("u1")).await.unwrap();
        }
        let two = svc
            .decks()
            .list(&DocumentFilter::new(), ListOrder::Created, Some(2))
            .await
            .unwrap();
        let names: Vec<_> = two.iter().map(|d| d.fields.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two"]);

        let none = svc
            .decks()
            .list(&DocumentFilter::new().field("user_id", "nobody"), ListOrder::Created, None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
