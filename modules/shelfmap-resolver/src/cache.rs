//! Process-local TTL cache for resolution results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Default time-to-live for cached resolutions.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Counters exposed for observability. `size` includes entries that have
/// expired but have not been swept yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

/// In-memory key/value cache with per-entry TTL and hit/miss counters.
///
/// Values sit behind `Arc`, so a hit hands back a shared reference to the
/// record stored at resolution time rather than a rebuilt one. The cache is
/// process-local by design: a restart or a second worker starts cold, and
/// the store's unique constraints absorb the re-resolution races that
/// follow.
pub struct ResolutionCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> ResolutionCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a key. An entry past its deadline counts as a miss and is
    /// removed on the spot, so `get` never returns stale data.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(Arc::clone(&entry.value));
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
                // Expired: retry under the write lock to evict it.
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap();
        match entries.get(key) {
            // A concurrent set may have refreshed the entry between locks.
            Some(entry) if entry.expires_at > now => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value under the cache's default TTL.
    pub fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store a value with an explicit TTL, replacing any existing entry.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value: Arc::new(value),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().unwrap().insert(key.to_string(), entry);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.read().unwrap().len(),
        }
    }
}

impl<V> Default for ResolutionCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_hits_and_misses() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        assert!(cache.get("acme").is_none());

        cache.set("acme", 7u32);
        assert_eq!(cache.get("acme").as_deref(), Some(&7));
        assert_eq!(cache.get("other"), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn expired_entries_read_as_misses_and_are_evicted() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        cache.set_with_ttl("acme", 7u32, Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(25));

        assert!(cache.get("acme").is_none());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 0, "expired entry should be gone after get");
    }

    #[test]
    fn hit_returns_the_stored_record() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        cache.set("acme", String::from("Acme Corp"));

        let first = cache.get("acme").unwrap();
        let second = cache.get("acme").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn set_replaces_existing_entry() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        cache.set("acme", 1u32);
        cache.set("acme", 2u32);
        assert_eq!(cache.get("acme").as_deref(), Some(&2));
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn purge_expired_reports_removals() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        cache.set_with_ttl("a", 1u32, Duration::from_millis(5));
        cache.set_with_ttl("b", 2u32, Duration::from_millis(5));
        cache.set("c", 3u32);
        std::thread::sleep(Duration::from_millis(25));

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.stats().size, 1);
    }
}
