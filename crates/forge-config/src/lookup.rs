//! Card-lookup throttling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Permits released per interval (10 requests per second).
const fn default_rate_limit_capacity() -> u32 {
    10
}

const fn default_rate_limit_interval_ms() -> u64 {
    1000
}

/// Identifiers per collection request accepted by the card-lookup service.
const fn default_batch_size() -> usize {
    75
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    #[serde(default = "default_rate_limit_capacity")]
    pub rate_limit_capacity: u32,

    #[serde(default = "default_rate_limit_interval_ms")]
    pub rate_limit_interval_ms: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            rate_limit_capacity: default_rate_limit_capacity(),
            rate_limit_interval_ms: default_rate_limit_interval_ms(),
            batch_size: default_batch_size(),
        }
    }
}

impl LookupConfig {
    #[must_use]
    pub const fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }
}
