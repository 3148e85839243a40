//! Migration Manager.
//!
//! Sequences schema and index setup over the life of a deployment. Applied,
//! failed and reverted migrations are tracked in `_migrations`, one row per
//! version: re-applying or reverting a version overwrites its row.
//!
//! ```text
//! pending → completed → reverted
//!         → failed
//! ```
//!
//! The current database version is the highest version whose row is
//! `completed`. Forward runs apply pending migrations in ascending order and
//! stop at the first failure, keeping earlier progress.

mod initial;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use forge_core::entities::MigrationRecord;
use forge_core::enums::MigrationStatus;

pub use initial::InitialSetup;

use crate::ForgeDb;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, get_u32, now, parse_datetime, parse_enum};
use crate::indexes::{MIGRATION_INDEXES, ensure_indexes};

/// Name of the bookkeeping table.
pub const MIGRATIONS_TABLE: &str = "_migrations";

const CREATE_MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER NOT NULL CHECK (version >= 1),
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    declared_at TEXT NOT NULL,
    applied_at TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('completed', 'failed', 'reverted')),
    error TEXT
)";

/// One ordered schema/index setup step.
#[async_trait]
pub trait Migration: Send + Sync {
    fn version(&self) -> u32;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn declared_at(&self) -> DateTime<Utc>;

    async fn up(&self, db: &ForgeDb) -> Result<(), DatabaseError>;
    async fn down(&self, db: &ForgeDb) -> Result<(), DatabaseError>;
}

/// A migration whose steps are SQL batches.
pub struct SqlMigration {
    version: u32,
    name: String,
    description: String,
    declared_at: DateTime<Utc>,
    up: String,
    down: String,
}

impl SqlMigration {
    pub fn new(
        version: u32,
        name: impl Into<String>,
        declared_at: DateTime<Utc>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            description: String::new(),
            declared_at,
            up: up.into(),
            down: down.into(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Migration for SqlMigration {
    fn version(&self) -> u32 {
        self.version
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn declared_at(&self) -> DateTime<Utc> {
        self.declared_at
    }

    async fn up(&self, db: &ForgeDb) -> Result<(), DatabaseError> {
        db.conn()
            .execute_batch(&self.up)
            .await
            .map_err(|e| DatabaseError::WriteFailure(format!("{}: {e}", self.name)))?;
        Ok(())
    }

    async fn down(&self, db: &ForgeDb) -> Result<(), DatabaseError> {
        db.conn()
            .execute_batch(&self.down)
            .await
            .map_err(|e| DatabaseError::WriteFailure(format!("{}: {e}", self.name)))?;
        Ok(())
    }
}

fn row_to_record(row: &libsql::Row) -> Result<MigrationRecord, DatabaseError> {
    Ok(MigrationRecord {
        version: get_u32(row, 0)?,
        name: row.get::<String>(1)?,
        description: row.get::<String>(2)?,
        declared_at: parse_datetime(&row.get::<String>(3)?)?,
        applied_at: parse_datetime(&row.get::<String>(4)?)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        error: get_opt_string(row, 6)?,
    })
}

/// Ordered set of registered migrations.
///
/// Registering two migrations with the same version is a caller error and is
/// not detected.
#[derive(Default)]
pub struct MigrationManager {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager holding the built-in migrations.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(InitialSetup));
        manager
    }

    /// Add a migration, keeping the set sorted by version.
    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
        self.migrations.sort_by_key(|m| m.version());
    }

    /// Registered migrations in ascending version order.
    #[must_use]
    pub fn migrations(&self) -> &[Box<dyn Migration>] {
        &self.migrations
    }

    /// Highest registered version, or 0 when none are registered.
    #[must_use]
    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map_or(0, |m| m.version())
    }

    /// Highest version recorded as `completed`, or 0.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the bookkeeping table cannot be created or read.
    pub async fn current_version(&self, db: &ForgeDb) -> Result<u32, DatabaseError> {
        Self::ensure_table(db).await?;
        let mut rows = db
            .conn()
            .query(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations WHERE status = 'completed'",
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_u32(&row, 0)
    }

    /// Registered migrations above the current version, ascending.
    ///
    /// # Errors
    ///
    /// Same as [`Self::current_version`].
    pub async fn pending(&self, db: &ForgeDb) -> Result<Vec<&dyn Migration>, DatabaseError> {
        let current = self.current_version(db).await?;
        Ok(self
            .migrations
            .iter()
            .map(|m| &**m)
            .filter(|m| m.version() > current)
            .collect())
    }

    /// Whether the current version equals the highest registered version.
    ///
    /// # Errors
    ///
    /// Same as [`Self::current_version`].
    pub async fn is_up_to_date(&self, db: &ForgeDb) -> Result<bool, DatabaseError> {
        Ok(self.current_version(db).await? == self.latest_version())
    }

    /// Every recorded migration row, highest version first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the table cannot be read or a row is malformed.
    pub async fn history(&self, db: &ForgeDb) -> Result<Vec<MigrationRecord>, DatabaseError> {
        Self::ensure_table(db).await?;
        let mut rows = db
            .conn()
            .query(
                "SELECT version, name, description, declared_at, applied_at, status, error
                 FROM _migrations ORDER BY version DESC",
                (),
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Apply every pending migration up to `target` (all when `None`), in
    /// ascending order. Returns the records written for completed migrations.
    ///
    /// # Errors
    ///
    /// `MigrationFailure` for the first migration whose `up` fails; its row is
    /// recorded as `failed`, later migrations are not attempted and earlier
    /// ones stay completed.
    pub async fn migrate(
        &self,
        db: &ForgeDb,
        target: Option<u32>,
    ) -> Result<Vec<MigrationRecord>, DatabaseError> {
        let current = self.current_version(db).await?;
        let selected = self
            .migrations
            .iter()
            .filter(|m| m.version() > current && target.is_none_or(|t| m.version() <= t));

        let mut applied = Vec::new();
        for migration in selected {
            tracing::info!(version = migration.version(), name = migration.name(), "applying migration");
            match migration.up(db).await {
                Ok(()) => {
                    let record = Self::record(&**migration, MigrationStatus::Completed, None);
                    Self::write_record(db, &record).await?;
                    applied.push(record);
                }
                Err(e) => {
                    return Err(Self::fail(db, &**migration, &e, "up").await);
                }
            }
        }

        if !applied.is_empty() {
            tracing::info!(count = applied.len(), version = self.current_version(db).await?, "migrations applied");
        }
        Ok(applied)
    }

    /// Revert every completed migration above `target`, highest first.
    /// Returns the records written for reverted migrations.
    ///
    /// # Errors
    ///
    /// `MigrationFailure` if a completed version is no longer registered or
    /// its `down` fails; the failing row is recorded as `failed` and the
    /// rollback halts.
    pub async fn rollback(
        &self,
        db: &ForgeDb,
        target: u32,
    ) -> Result<Vec<MigrationRecord>, DatabaseError> {
        let completed: Vec<u32> = self
            .history(db)
            .await?
            .into_iter()
            .filter(|r| r.status == MigrationStatus::Completed && r.version > target)
            .map(|r| r.version)
            .collect();

        let mut reverted = Vec::new();
        for version in completed {
            let Some(migration) = self.migrations.iter().find(|m| m.version() == version) else {
                return Err(DatabaseError::MigrationFailure {
                    version,
                    name: String::new(),
                    reason: "migration is not registered".into(),
                });
            };

            tracing::info!(version, name = migration.name(), "reverting migration");
            match migration.down(db).await {
                Ok(()) => {
                    let record = Self::record(&**migration, MigrationStatus::Reverted, None);
                    Self::write_record(db, &record).await?;
                    reverted.push(record);
                }
                Err(e) => {
                    return Err(Self::fail(db, &**migration, &e, "down").await);
                }
            }
        }
        Ok(reverted)
    }

    async fn ensure_table(db: &ForgeDb) -> Result<(), DatabaseError> {
        db.conn()
            .execute(CREATE_MIGRATIONS_TABLE, ())
            .await
            .map_err(|e| DatabaseError::WriteFailure(format!("{MIGRATIONS_TABLE}: {e}")))?;
        ensure_indexes(db, MIGRATIONS_TABLE, MIGRATION_INDEXES).await?;
        Ok(())
    }

    fn record(
        migration: &dyn Migration,
        status: MigrationStatus,
        error: Option<String>,
    ) -> MigrationRecord {
        MigrationRecord {
            version: migration.version(),
            name: migration.name().to_string(),
            description: migration.description().to_string(),
            declared_at: migration.declared_at(),
            applied_at: now(),
            status,
            error,
        }
    }

    /// Record a failed step and build the error to return. A failure to write
    /// the `failed` row is logged and reported inside the returned error.
    async fn fail(
        db: &ForgeDb,
        migration: &dyn Migration,
        cause: &DatabaseError,
        step: &str,
    ) -> DatabaseError {
        tracing::error!(
            version = migration.version(),
            name = migration.name(),
            step,
            error = %cause,
            "migration failed"
        );
        let mut reason = cause.to_string();
        let record = Self::record(migration, MigrationStatus::Failed, Some(reason.clone()));
        if let Err(e) = Self::write_record(db, &record).await {
            tracing::error!(version = migration.version(), error = %e, "could not record migration failure");
            reason = format!("{reason} (failure not recorded: {e})");
        }
        DatabaseError::MigrationFailure {
            version: migration.version(),
            name: migration.name().to_string(),
            reason,
        }
    }

    async fn write_record(db: &ForgeDb, record: &MigrationRecord) -> Result<(), DatabaseError> {
        db.conn()
            .execute(
                "INSERT INTO _migrations (version, name, description, declared_at, applied_at, status, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(version) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    declared_at = excluded.declared_at,
                    applied_at = excluded.applied_at,
                    status = excluded.status,
                    error = excluded.error",
                libsql::params![
                    i64::from(record.version),
                    record.name.as_str(),
                    record.description.as_str(),
                    format_datetime(&record.declared_at),
                    format_datetime(&record.applied_at),
                    record.status.as_str(),
                    record.error.as_deref()
                ],
            )
            .await
            .map_err(|e| DatabaseError::WriteFailure(format!("{MIGRATIONS_TABLE}: {e}")))?;
        Ok(())
    }
}
