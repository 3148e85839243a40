//! In-process TTL cache for card lookups.
//!
//! Entries expire `ttl` after they are written; a zero TTL never expires.
//! Expired entries are never returned, and are dropped either lazily on read
//! or by [`TtlCache::purge_expired`], which [`TtlCache::spawn_purger`] runs
//! every check period.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use forge_config::CacheConfig;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };
        Self { value, expires_at }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// String-keyed cache with per-entry expiry.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    default_ttl: Duration,
    check_period: Duration,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    #[must_use]
    pub fn new(default_ttl: Duration, check_period: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            check_period,
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.default_ttl(), config.check_period())
    }

    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        None
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries
            .write()
            .await
            .insert(key.into(), Entry::new(value, ttl));
    }

    /// Write with the configured default TTL.
    pub async fn put(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl).await;
    }

    /// Returns whether a live entry was removed.
    pub async fn delete(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .write()
            .await
            .remove(key)
            .is_some_and(|e| e.is_live(now))
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Live entries among `keys`. Missing and expired keys are left out.
    pub async fn get_many<S: AsRef<str>>(&self, keys: &[S]) -> HashMap<String, V> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        keys.iter()
            .filter_map(|key| {
                let key = key.as_ref();
                entries
                    .get(key)
                    .filter(|e| e.is_live(now))
                    .map(|e| (key.to_string(), e.value.clone()))
            })
            .collect()
    }

    pub async fn set_many<I>(&self, items: I, ttl: Duration)
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let mut entries = self.entries.write().await;
        for (key, value) in items {
            entries.insert(key, Entry::new(value, ttl));
        }
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = entries.len(), "purged expired cache entries");
        }
        purged
    }

    /// Live entry count.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Purge expired entries every check period until the handle is aborted
    /// or the last other reference to the cache is dropped.
    pub fn spawn_purger(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = self.check_period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                cache.purge_expired().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINUTE: Duration = Duration::from_secs(60);

    fn cache() -> TtlCache<String> {
        TtlCache::new(MINUTE, MINUTE * 10)
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = cache();
        cache.set("bolt", "Lightning Bolt".to_string(), MINUTE).await;
        assert_eq!(cache.get("bolt").await.as_deref(), Some("Lightning Bolt"));

        tokio::time::advance(MINUTE - Duration::from_millis(1)).await;
        assert!(cache.get("bolt").await.is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("bolt").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_never_expires() {
        let cache = cache();
        cache.set("forever", "x".to_string(), Duration::ZERO).await;
        tokio::time::advance(MINUTE * 1000).await;
        assert!(cache.get("forever").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn put_uses_default_ttl() {
        let cache = cache();
        cache.put("bolt", "x".to_string()).await;
        tokio::time::advance(MINUTE).await;
        assert!(cache.get("bolt").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn get_many_skips_missing_and_expired() {
        let cache = cache();
        cache
            .set_many(
                [("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())],
                MINUTE,
            )
            .await;
        cache.set("c", "3".to_string(), MINUTE * 2).await;
        tokio::time::advance(MINUTE).await;

        let found = cache.get_many(&["a", "b", "c", "d"]).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("c").map(String::as_str), Some("3"));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_and_clear() {
        let cache = cache();
        cache.set("a", "1".to_string(), MINUTE).await;
        cache.set("b", "2".to_string(), MINUTE).await;
        assert!(cache.delete("a").await);
        assert!(!cache.delete("a").await);
        cache.clear().await;
        assert!(cache.get("b").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired() {
        let cache = cache();
        cache.set("short", "1".to_string(), MINUTE).await;
        cache.set("long", "2".to_string(), MINUTE * 5).await;
        tokio::time::advance(MINUTE * 2).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.purge_expired().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn purger_runs_each_check_period() {
        let cache = Arc::new(TtlCache::new(MINUTE, MINUTE * 10));
        cache.set("a", 1_u32, MINUTE).await;
        let handle = cache.spawn_purger();

        tokio::time::sleep(MINUTE * 10 + Duration::from_secs(1)).await;
        assert_eq!(cache.entries.read().await.len(), 0);
        handle.abort();
    }
}
