use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::MigrationStatus;

/// One row of `_migrations`: the latest outcome recorded for a migration version.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MigrationRecord {
    #[schemars(range(min = 1))]
    pub version: u32,
    #[schemars(length(min = 1))]
    pub name: String,
    pub description: String,
    /// When the migration was authored.
    pub declared_at: DateTime<Utc>,
    /// When this outcome was recorded.
    pub applied_at: DateTime<Utc>,
    pub status: MigrationStatus,
    pub error: Option<String>,
}
