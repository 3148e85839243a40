//! Token-bucket rate limiter for outbound card lookups.
//!
//! The bucket starts full. Each whole interval that passes adds `capacity`
//! tokens, capped at `capacity`; partial intervals add nothing. A caller that
//! finds the bucket empty sleeps one interval and checks again.

use std::time::Duration;

use forge_config::LookupConfig;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ServiceError;

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// Shared by `Arc` between every task issuing lookups.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    interval: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// # Errors
    ///
    /// `InvalidConfig` when `capacity` or `interval` is zero.
    pub fn new(capacity: u32, interval: Duration) -> Result<Self, ServiceError> {
        if capacity == 0 {
            return Err(ServiceError::InvalidConfig(
                "rate limit capacity must be at least 1".into(),
            ));
        }
        if interval.is_zero() {
            return Err(ServiceError::InvalidConfig(
                "rate limit interval must be non-zero".into(),
            ));
        }
        Ok(Self {
            capacity,
            interval,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        })
    }

    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn from_config(config: &LookupConfig) -> Result<Self, ServiceError> {
        Self::new(config.rate_limit_capacity, config.rate_limit_interval())
    }

    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Take one token, waiting for a refill while the bucket is empty.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire().await {
                return;
            }
            tracing::debug!(
                capacity = self.capacity,
                interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
                "rate limit reached, waiting for refill"
            );
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Take one token if one is available right now.
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Tokens available right now.
    pub async fn available(&self) -> u32 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let intervals = now.duration_since(state.last_refill).as_nanos() / self.interval.as_nanos();
        if intervals == 0 {
            return;
        }
        let added = intervals.saturating_mul(u128::from(self.capacity));
        let tokens = u128::from(state.tokens)
            .saturating_add(added)
            .min(u128::from(self.capacity));
        state.tokens = u32::try_from(tokens).unwrap_or(self.capacity);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECOND: Duration = Duration::from_secs(1);

    async fn drain(bucket: &TokenBucket) -> u32 {
        let mut taken = 0;
        while bucket.try_acquire().await {
            taken += 1;
        }
        taken
    }

    #[tokio::test(start_paused = true)]
    async fn starts_full() {
        let bucket = TokenBucket::new(3, SECOND).unwrap();
        assert_eq!(bucket.available().await, 3);
        assert_eq!(drain(&bucket).await, 3);
        assert!(!bucket.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_interval_adds_nothing() {
        let bucket = TokenBucket::new(2, SECOND).unwrap();
        drain(&bucket).await;
        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!bucket.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn checks_inside_an_interval_do_not_delay_refill() {
        let bucket = TokenBucket::new(1, SECOND).unwrap();
        drain(&bucket).await;
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(!bucket.try_acquire().await);
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(bucket.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn whole_interval_refills_to_capacity() {
        let bucket = TokenBucket::new(2, SECOND).unwrap();
        drain(&bucket).await;
        tokio::time::advance(SECOND).await;
        assert_eq!(drain(&bucket).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn long_idle_is_capped() {
        let bucket = TokenBucket::new(4, SECOND).unwrap();
        bucket.try_acquire().await;
        tokio::time::advance(SECOND * 30).await;
        assert_eq!(bucket.available().await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_refill() {
        let bucket = TokenBucket::new(2, SECOND).unwrap();
        drain(&bucket).await;

        let started = Instant::now();
        bucket.acquire().await;
        assert!(started.elapsed() >= SECOND);
        assert_eq!(bucket.available().await, 1);
    }

    #[test]
    fn rejects_zero_capacity_or_interval() {
        assert!(matches!(
            TokenBucket::new(0, SECOND),
            Err(ServiceError::InvalidConfig(_))
        ));
        assert!(matches!(
            TokenBucket::new(1, Duration::ZERO),
            Err(ServiceError::InvalidConfig(_))
        ));
    }
}
