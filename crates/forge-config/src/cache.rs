//! Lookup cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One hour.
const fn default_ttl_secs() -> u64 {
    3600
}

const fn default_check_period_secs() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// TTL applied to cached card lookups.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// How often expired entries are purged.
    #[serde(default = "default_check_period_secs")]
    pub check_period_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            check_period_secs: default_check_period_secs(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    #[must_use]
    pub const fn check_period(&self) -> Duration {
        Duration::from_secs(self.check_period_secs)
    }
}
