//! Retry policy for conflicting read-modify-write cycles.
//!
//! `update` and `rollback` advance a document with a conditional write keyed
//! on the version they read. When another writer advanced it first the write
//! matches no row and the whole cycle is retried with exponential backoff.

use std::time::Duration;

use forge_config::DatabaseConfig;

/// Configuration for retrying a versioned mutation after a lost race.
#[derive(Debug, Clone)]
pub struct ConflictRetry {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for ConflictRetry {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
        }
    }
}

impl ConflictRetry {
    /// Fail on the first conflict.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            max_attempts: config.conflict_retries,
            ..Self::default()
        }
    }

    /// Attempts to make, never fewer than one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let retry = ConflictRetry::default();
        assert_eq!(retry.delay_for(1), Duration::from_millis(10));
        assert_eq!(retry.delay_for(2), Duration::from_millis(20));
        assert_eq!(retry.delay_for(3), Duration::from_millis(40));
        assert_eq!(retry.delay_for(10), Duration::from_millis(200));
        assert_eq!(retry.delay_for(40), Duration::from_millis(200));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let retry = ConflictRetry {
            max_attempts: 0,
            ..ConflictRetry::default()
        };
        assert_eq!(retry.attempts(), 1);
        assert_eq!(ConflictRetry::no_retry().attempts(), 1);
    }

    #[test]
    fn from_config_uses_configured_attempts() {
        let config = DatabaseConfig {
            conflict_retries: 7,
            ..DatabaseConfig::default()
        };
        assert_eq!(ConflictRetry::from_config(&config).max_attempts, 7);
    }
}
