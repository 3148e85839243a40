//! Database error types for forge-db.

use forge_schema::SchemaError;
use thiserror::Error;

/// Errors from document store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No live document matched the filter.
    #[error("No document in '{collection}' matches {filter}")]
    NotFound { collection: String, filter: String },

    /// A rollback or lookup named a version with no history record.
    #[error("Document '{document_id}' has no version {version}")]
    VersionNotFound { document_id: String, version: u32 },

    /// The storage engine rejected an insert, update or delete.
    #[error("Write failed: {0}")]
    WriteFailure(String),

    /// Caller-supplied fields failed schema constraints; nothing was written.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A migration's `up` or `down` step failed.
    #[error("Migration {version} ({name}) failed: {reason}")]
    MigrationFailure {
        version: u32,
        name: String,
        reason: String,
    },

    /// Another writer advanced the document first, on every attempt.
    #[error(
        "Conflicting write on '{collection}' document '{document_id}' (expected version {expected_version})"
    )]
    Conflict {
        collection: String,
        document_id: String,
        expected_version: u32,
    },

    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (unknown schema, illegal status transition).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SchemaError> for DatabaseError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::ValidationFailed { .. } => Self::Validation(e.to_string()),
            other => Self::InvalidState(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Other(e.into())
    }
}
