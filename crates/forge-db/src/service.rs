//! Service layer for ProxyForge decks and cards.
//!
//! `ForgeService` wraps `ForgeDb` (raw database access), `SchemaRegistry`
//! (validation) and the conflict retry policy. Domain operations are
//! implemented as `impl ForgeService` blocks in `repos/`, each delegating to
//! the Version Control Manager for its entity type.

use forge_config::ForgeConfig;
use forge_core::entities::{CardFields, DeckFields};
use forge_core::version::Versioned;
use forge_schema::SchemaRegistry;

use crate::ForgeDb;
use crate::error::DatabaseError;
use crate::migrations::MigrationManager;
use crate::retry::ConflictRetry;
use crate::version_control::VersionControlManager;

const DEFAULT_HISTORY_LIMIT: u32 = 50;

pub struct ForgeService {
    db: ForgeDb,
    schema: SchemaRegistry,
    retry: ConflictRetry,
    history_limit: u32,
}

impl ForgeService {
    /// Open a local database with default settings and apply pending migrations.
    ///
    /// # Arguments
    ///
    /// * `db_path`: Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or a migration fails.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = ForgeDb::open_local(db_path).await?;
        MigrationManager::with_defaults().migrate(&db, None).await?;
        Ok(Self::from_db(db))
    }

    /// Open the database named by `config`, applying migrations when
    /// `database.run_migrations` is set.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or a migration fails.
    pub async fn from_config(config: &ForgeConfig) -> Result<Self, DatabaseError> {
        let db = ForgeDb::open_local(&config.database.path).await?;
        if config.database.run_migrations {
            MigrationManager::with_defaults().migrate(&db, None).await?;
        }
        Ok(Self {
            db,
            schema: SchemaRegistry::new(),
            retry: ConflictRetry::from_config(&config.database),
            history_limit: config.history.default_limit,
        })
    }

    /// Create from an existing `ForgeDb` without running migrations.
    #[must_use]
    pub fn from_db(db: ForgeDb) -> Self {
        Self {
            db,
            schema: SchemaRegistry::new(),
            retry: ConflictRetry::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: ConflictRetry) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn db(&self) -> &ForgeDb {
        &self.db
    }

    #[must_use]
    pub const fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Mutable registry access, for registering schemas of additional
    /// versioned types before using [`Self::manager`] with them.
    pub const fn schema_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.schema
    }

    #[must_use]
    pub const fn retry(&self) -> &ConflictRetry {
        &self.retry
    }

    /// Page size applied to history queries that do not set a limit.
    #[must_use]
    pub const fn history_limit(&self) -> u32 {
        self.history_limit
    }

    /// The Version Control Manager for any versioned type.
    #[must_use]
    pub const fn manager<F: Versioned>(&self) -> VersionControlManager<'_, F> {
        VersionControlManager::new(&self.db, &self.schema, &self.retry)
    }

    #[must_use]
    pub const fn decks(&self) -> VersionControlManager<'_, DeckFields> {
        self.manager()
    }

    #[must_use]
    pub const fn cards(&self) -> VersionControlManager<'_, CardFields> {
        self.manager()
    }
}
