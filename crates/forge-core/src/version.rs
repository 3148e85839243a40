//! Version-control record shapes.
//!
//! A versioned entity type `F` (its domain fields only) is stored in two shapes:
//!
//! - [`Document<F>`]: the live, mutable record. Metadata (`id`,
//!   `current_version`, timestamps) sits beside the fields.
//! - [`VersionRecord<F>`]: one immutable snapshot per mutation, labeled with the
//!   version that mutation produced. Record `N` holds the fields exactly as they
//!   were right after the document reached version `N`; record 1 is the
//!   creation snapshot.
//!
//! [`Document::snapshot`] is the mapping between the two shapes: it strips the
//! version-control metadata and yields the storable snapshot.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Change reason stamped on version 1 when the caller gives none.
pub const INITIAL_VERSION_REASON: &str = "Initial version";

/// Default change reason for a rollback to `target_version`.
#[must_use]
pub fn rollback_reason(target_version: u32) -> String {
    format!("Rollback to version {target_version}")
}

/// A domain-field type that can be stored under version control.
///
/// Implementors declare where their two record shapes live and which schema
/// validates the fields.
pub trait Versioned: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Live-document collection, e.g. `decks`.
    const COLLECTION: &'static str;
    /// Append-only history collection, e.g. `deck_versions`.
    const HISTORY_COLLECTION: &'static str;
    /// Schema registry name for the domain fields.
    const SCHEMA: &'static str;
    /// Schema registry name for a full history record.
    const VERSION_SCHEMA: &'static str;
    /// ID prefix for live documents.
    const ID_PREFIX: &'static str;
    /// ID prefix for history records.
    const VERSION_ID_PREFIX: &'static str;
}

/// The live representation of a versioned entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document<F> {
    pub id: String,
    #[serde(flatten)]
    pub fields: F,
    pub current_version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<F: Clone> Document<F> {
    /// Domain fields with all version-control metadata stripped.
    #[must_use]
    pub fn snapshot(&self) -> F {
        self.fields.clone()
    }
}

/// An immutable snapshot written once per mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VersionRecord<F> {
    pub id: String,
    pub document_id: String,
    pub version: u32,
    pub snapshot: F,
    pub timestamp: DateTime<Utc>,
    pub changed_by: String,
    pub change_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<F> VersionRecord<F> {
    #[must_use]
    pub fn metadata(&self) -> VersionMetadata {
        VersionMetadata {
            version: self.version,
            timestamp: self.timestamp,
            changed_by: self.changed_by.clone(),
            change_reason: self.change_reason.clone(),
        }
    }
}

/// Who changed what, when, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub changed_by: String,
    pub change_reason: Option<String>,
}

/// Structural diff between two adjacent history records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChange<F> {
    pub before: F,
    pub after: F,
    /// Top-level field names whose values differ, sorted.
    pub changed_fields: Vec<String>,
    /// Metadata of the `after` record.
    pub metadata: VersionMetadata,
}

impl<F: Serialize + Clone> VersionChange<F> {
    /// Diff two adjacent records.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if either snapshot fails to serialize.
    pub fn between(
        before: &VersionRecord<F>,
        after: &VersionRecord<F>,
    ) -> Result<Self, serde_json::Error> {
        let changed_fields = changed_fields(
            &serde_json::to_value(&before.snapshot)?,
            &serde_json::to_value(&after.snapshot)?,
        );
        Ok(Self {
            before: before.snapshot.clone(),
            after: after.snapshot.clone(),
            changed_fields,
            metadata: after.metadata(),
        })
    }
}

/// Names of top-level keys whose values differ between two JSON objects.
///
/// A key present on only one side counts as changed. Non-object inputs compare
/// as a whole and report no field names.
#[must_use]
pub fn changed_fields(before: &serde_json::Value, after: &serde_json::Value) -> Vec<String> {
    let (Some(b), Some(a)) = (before.as_object(), after.as_object()) else {
        return Vec::new();
    };
    let mut names: Vec<String> = b
        .keys()
        .chain(a.keys())
        .filter(|k| b.get(*k) != a.get(*k))
        .cloned()
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Paged, windowed view of a document's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionHistory<F> {
    pub document_id: String,
    pub changes: Vec<VersionChange<F>>,
    /// Records matching the version window, ignoring `skip`/`limit`.
    pub total: u64,
}

/// Options shared by every versioned mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedUpdateOptions {
    pub actor_id: String,
    pub change_reason: Option<String>,
}

impl VersionedUpdateOptions {
    pub fn by(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            change_reason: None,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.change_reason = Some(reason.into());
        self
    }
}

/// Options for restoring a historical snapshot as a new version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackOptions {
    pub target_version: u32,
    pub actor_id: String,
    pub change_reason: Option<String>,
}

impl RollbackOptions {
    pub fn to(target_version: u32, actor_id: impl Into<String>) -> Self {
        Self {
            target_version,
            actor_id: actor_id.into(),
            change_reason: None,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.change_reason = Some(reason.into());
        self
    }
}

/// Version window and pagination for history queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryOptions {
    pub from_version: Option<u32>,
    pub to_version: Option<u32>,
    pub skip: Option<u32>,
    /// `None` or `Some(0)` means no limit.
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
    struct Spell {
        name: String,
        cost: u32,
    }

    fn record(version: u32, name: &str, cost: u32) -> VersionRecord<Spell> {
        let now = Utc::now();
        VersionRecord {
            id: format!("spv-{version:08x}"),
            document_id: "spl-00000001".into(),
            version,
            snapshot: Spell {
                name: name.into(),
                cost,
            },
            timestamp: now,
            changed_by: "u1".into(),
            change_reason: Some(format!("v{version}")),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn document_flattens_fields() {
        let now = Utc::now();
        let doc = Document {
            id: "spl-00000001".into(),
            fields: Spell {
                name: "Bolt".into(),
                cost: 1,
            },
            current_version: 1,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["name"], "Bolt");
        assert_eq!(json["current_version"], 1);
        assert_eq!(doc.snapshot(), doc.fields);
    }

    #[test]
    fn change_between_adjacent_records() {
        let change = VersionChange::between(&record(1, "Bolt", 1), &record(2, "Bolt2", 1)).unwrap();
        assert_eq!(change.changed_fields, vec!["name".to_string()]);
        assert_eq!(change.before.name, "Bolt");
        assert_eq!(change.after.name, "Bolt2");
        assert_eq!(change.metadata.version, 2);
        assert_eq!(change.metadata.change_reason.as_deref(), Some("v2"));
    }

    #[test]
    fn changed_fields_counts_one_sided_keys() {
        let fields = changed_fields(&json!({"a": 1, "b": 2}), &json!({"b": 3, "c": 4}));
        assert_eq!(fields, vec!["a", "b", "c"]);
        assert!(changed_fields(&json!(1), &json!(2)).is_empty());
    }

    #[test]
    fn rollback_reason_format() {
        assert_eq!(rollback_reason(1), "Rollback to version 1");
    }

    #[test]
    fn option_builders() {
        let opts = VersionedUpdateOptions::by("u1").reason("rename");
        assert_eq!(opts.actor_id, "u1");
        assert_eq!(opts.change_reason.as_deref(), Some("rename"));

        let rb = RollbackOptions::to(3, "u2");
        assert_eq!(rb.target_version, 3);
        assert!(rb.change_reason.is_none());
    }
}
