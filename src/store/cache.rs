//! In-memory response cache with per-entry expiry
//!
//! Entries are evicted lazily on read and by a periodic sweep. There is no
//! size bound: memory is reclaimed only through expiry or explicit deletes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// TTL applied by [`TtlCache::set`]
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cadence of the background sweep
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Time-expiring key/value map
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store a value with the default TTL, replacing any previous entry
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Store a value that expires `ttl` from now
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Remove an entry whether or not it has expired
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn cleanup(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> TtlCache<V> {
    /// Get a live value. An expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = self.entries.get(key)?.is_expired(now);
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }
}

impl TtlCache<Value> {
    /// Typed read. A value that no longer decodes as `T` is evicted.
    pub fn get_json<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(cache_key = key, error = %err, "cached value has unexpected shape; evicting");
                self.delete(key);
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("serialize cache value for `{key}`"))?;
        self.set_with_ttl(key, value, ttl);
        Ok(())
    }
}

/// Cache shared between the worker and the sweeper task
pub type SharedCache<V> = Arc<Mutex<TtlCache<V>>>;

pub fn shared<V>(default_ttl: Duration) -> SharedCache<V> {
    Arc::new(Mutex::new(TtlCache::with_default_ttl(default_ttl)))
}

/// Lock the cache, recovering the map if a previous holder panicked
pub fn lock<V>(cache: &SharedCache<V>) -> MutexGuard<'_, TtlCache<V>> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run `cleanup` every `every` until the returned handle is aborted
pub fn spawn_sweeper<V: Send + 'static>(cache: SharedCache<V>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = lock(&cache).cleanup();
            if removed > 0 {
                debug!(removed, "cache sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_deadline() {
        let mut cache = TtlCache::new();
        cache.set_with_ttl("a", 1, Duration::from_millis(1000));

        advance(Duration::from_millis(999)).await;
        assert_eq!(cache.get("a"), Some(1));

        advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("a"), None);
        // Lazy eviction removed it on read
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_is_five_minutes() {
        let mut cache = TtlCache::new();
        cache.set("offers", "cached");

        advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("offers"), Some("cached"));

        advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("offers"), None);
    }

    #[test]
    fn test_overwrite_is_last_write_wins() {
        let mut cache = TtlCache::new();
        cache.set("k", "x".to_string());
        cache.set("k", "y".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("y"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_delete_is_unconditional() {
        let mut cache = TtlCache::new();
        cache.set("k", 7);
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_sweeps_without_reads() {
        let mut cache = TtlCache::new();
        for key in ["a", "b", "c"] {
            cache.set_with_ttl(key, 0u8, Duration::from_millis(10));
        }
        cache.set_with_ttl("long", 1u8, Duration::from_secs(60));

        advance(Duration::from_millis(20)).await;
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.cleanup(), 3);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let cache = shared::<u32>(DEFAULT_TTL);
        lock(&cache).set_with_ttl("a", 1, Duration::from_secs(60));
        lock(&cache).set_with_ttl("b", 2, Duration::from_secs(60));

        let sweeper = spawn_sweeper(cache.clone(), SWEEP_INTERVAL);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(lock(&cache).len(), 2);

        tokio::time::sleep(SWEEP_INTERVAL).await;
        assert_eq!(lock(&cache).len(), 0);

        sweeper.abort();
    }

    #[test]
    fn test_json_helpers() {
        let mut cache: TtlCache<Value> = TtlCache::new();
        cache
            .set_json("ids", &vec![1u32, 2, 3], Duration::from_secs(5))
            .unwrap();
        let ids: Option<Vec<u32>> = cache.get_json("ids");
        assert_eq!(ids, Some(vec![1, 2, 3]));

        // Wrong shape evicts
        let wrong: Option<String> = cache.get_json("ids");
        assert!(wrong.is_none());
        assert!(cache.is_empty());
    }
}
