//! Document store configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".proxyforge/proxyforge.db".to_string()
}

/// Default number of attempts for a conflicting read-modify-write cycle.
const fn default_conflict_retries() -> u32 {
    3
}

const fn default_run_migrations() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Attempts (including the first) before a version conflict is reported.
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,

    /// Apply pending migrations when the database is opened.
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            conflict_retries: default_conflict_retries(),
            run_migrations: default_run_migrations(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}
