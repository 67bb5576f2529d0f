//! In-process TTL cache.
//!
//! [`CacheStore`] keeps values in a `HashMap` behind a single
//! [`std::sync::RwLock`]. All operations are synchronous and hold the lock
//! only for the map access itself, so they are safe to call from async
//! handlers. Expiry is lazy: an expired entry is dropped by the first `get`
//! that sees it. [`CacheStore::spawn_sweeper`] adds an optional periodic
//! purge so entries nobody reads again do not accumulate.

pub mod key;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

pub use key::CacheKey;

/// A cached value and its deadline.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when `now + ttl` overflowed; such entries never expire.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Keyed store with per-entry time-to-live.
///
/// # Concurrency
///
/// - `get` on a live entry takes the read lock only.
/// - `set`, `clear` and lazy expiry take the write lock.
/// - Concurrent `set`s on one key resolve last-writer-wins.
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> CacheStore<V> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `value` under `key` for `ttl`, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Returns a clone of the value under `key` if it has not expired.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match map.get(key) {
                None => return None,
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check under the write lock: a concurrent `set` may have
        // refreshed the entry in between.
        match map.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    /// Removes every key containing `pattern`, or everything when `pattern`
    /// is `None`. Returns the number of entries removed.
    pub fn clear(&self, pattern: Option<&str>) -> usize {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        match pattern {
            Some(p) => map.retain(|key, _| !key.contains(p)),
            None => map.clear(),
        }
        before - map.len()
    }

    /// Drops all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, entry| entry.is_live(now));
        before - map.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send + Sync + 'static> CacheStore<V> {
    /// Spawns a task that calls [`CacheStore::purge_expired`] every `every`.
    ///
    /// The task holds only a weak reference and exits once the store is
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = store.len(), "cache sweep");
                }
            }
        })
    }
}

impl<V: Clone> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let cache = CacheStore::new();
        cache.set("a", 1_u32, Duration::from_secs(60));
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn set_overwrites() {
        let cache = CacheStore::new();
        cache.set("a", 1_u32, Duration::from_secs(60));
        cache.set("a", 2_u32, Duration::from_secs(60));
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = CacheStore::new();
        cache.set("short", "v".to_string(), Duration::from_millis(1));
        assert_eq!(cache.get("short").as_deref(), Some("v"));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("short"), None);
        assert!(cache.is_empty(), "expired entry is removed on read");
    }

    #[test]
    fn zero_ttl_is_immediately_absent() {
        let cache = CacheStore::new();
        cache.set("k", 1_u8, Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn huge_ttl_never_expires() {
        let cache = CacheStore::new();
        cache.set("k", 1_u8, Duration::MAX);
        assert_eq!(cache.get("k"), Some(1));
    }

    #[test]
    fn clear_by_substring() {
        let cache = CacheStore::new();
        cache.set("dashboard_user1_USER", 1_u8, Duration::from_secs(60));
        cache.set("dashboard_user2_OPERATOR", 2_u8, Duration::from_secs(60));
        let removed = cache.clear(Some("dashboard_user1"));
        assert_eq!(removed, 1);
        assert_eq!(cache.get("dashboard_user1_USER"), None);
        assert_eq!(cache.get("dashboard_user2_OPERATOR"), Some(2));
    }

    #[test]
    fn clear_pattern_is_literal() {
        let cache = CacheStore::new();
        cache.set("dashboard_a_USER", 1_u8, Duration::from_secs(60));
        assert_eq!(cache.clear(Some("dashboard_*")), 0);
        assert_eq!(cache.clear(Some(".*")), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_all() {
        let cache = CacheStore::new();
        cache.set("a", 1_u8, Duration::from_secs(60));
        cache.set("b", 2_u8, Duration::from_secs(60));
        assert_eq!(cache.clear(None), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_keeps_live_entries() {
        let cache = CacheStore::new();
        cache.set("live", 1_u8, Duration::from_secs(60));
        cache.set("dead", 2_u8, Duration::ZERO);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("live"), Some(1));
    }

    #[test]
    fn concurrent_access_does_not_corrupt() {
        let cache = Arc::new(CacheStore::new());
        let mut handles = Vec::with_capacity(8);
        for t in 0..8_u32 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..200_u32 {
                    let key = format!("k{}", i % 16);
                    cache.set(key.clone(), t, Duration::from_secs(60));
                    let _ = cache.get(&key);
                    if i % 50 == 0 {
                        cache.clear(Some("k1"));
                    }
                }
            }));
        }
        for h in handles {
            assert!(h.join().is_ok());
        }
        assert!(cache.len() <= 16);
    }

    #[tokio::test]
    async fn sweeper_purges_and_stops_with_store() {
        let cache = Arc::new(CacheStore::new());
        cache.set("dead", 1_u8, Duration::ZERO);
        cache.set("live", 2_u8, Duration::from_secs(60));
        let handle = cache.spawn_sweeper(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.len(), 1);

        drop(cache);
        let stopped = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(stopped.is_ok(), "sweeper exits once the store is dropped");
    }
}
