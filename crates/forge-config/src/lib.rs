//! # forge-config
//!
//! Layered configuration loading for ProxyForge using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`PROXYFORGE_*` prefix, `__` as separator)
//! 2. Project-level `.proxyforge/config.toml`
//! 3. User-level `~/.config/proxyforge/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! `PROXYFORGE_DATABASE__PATH` maps to `database.path`,
//! `PROXYFORGE_LOOKUP__BATCH_SIZE` to `lookup.batch_size`, and so on.
//!
//! # Usage
//!
//! ```no_run
//! use forge_config::ForgeConfig;
//!
//! let config = ForgeConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.database.path);
//! ```

mod cache;
mod database;
mod error;
mod history;
mod lookup;

pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use history::HistoryConfig;
pub use lookup::LookupConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for every override.
pub const ENV_PREFIX: &str = "PROXYFORGE_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl ForgeConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does not read `.env`; see [`Self::load_with_dotenv`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source fails to parse or extract, and
    /// `ConfigError::InvalidValue` if an extracted value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Load configuration after reading `.env` from the workspace root.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Extract and validate a config from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".proxyforge/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject values that would stall or disable the components they configure.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("database.path", self.database.path.trim().is_empty()),
            ("database.conflict_retries", self.database.conflict_retries == 0),
            ("lookup.rate_limit_capacity", self.lookup.rate_limit_capacity == 0),
            ("lookup.rate_limit_interval_ms", self.lookup.rate_limit_interval_ms == 0),
            ("lookup.batch_size", self.lookup.batch_size == 0),
            ("cache.check_period_secs", self.cache.check_period_secs == 0),
        ];
        match checks.iter().find(|(_, bad)| *bad) {
            Some((field, _)) => Err(ConfigError::InvalidValue {
                field: (*field).to_string(),
                reason: "must be non-empty and non-zero".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("proxyforge").join("config.toml"))
    }

    /// Walks up from `CARGO_MANIFEST_DIR` (crate -> crates/ -> root) looking
    /// for `.env`, then falls back to the current directory.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ForgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.default_limit, 50);
    }

    #[test]
    fn figment_builds_without_files() {
        let config: ForgeConfig = Figment::from(Serialized::defaults(ForgeConfig::default()))
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.lookup.batch_size, 75);
        assert_eq!(config.cache.default_ttl_secs, 3600);
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let mut config = ForgeConfig::default();
        config.lookup.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "lookup.batch_size")
        );
    }
}
