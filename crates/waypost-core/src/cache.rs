//! Bounded LRU cache for resolved routes.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use waypost_types::{Method, Params, RouteEntry};

/// A previously resolved `(path, method)` pair.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub entry: Arc<RouteEntry>,
    pub params: Params,
}

/// Cache hit/miss/eviction counters, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

type Key = (String, Method);

/// Maps `(path, method)` to the route and parameters a full scan produced.
///
/// Strictly least-recently-used: `lookup` refreshes recency and `insert`
/// at capacity evicts the coldest entry. The route table is immutable
/// after startup, so entries never go stale and a hit is behaviorally
/// identical to a fresh scan. A capacity of zero disables caching
/// entirely; resolution results must not change, only their cost.
///
/// One mutex guards the LRU order. Concurrent readers and writers see
/// either the prior state or the new entry, never a torn one; recency
/// under contention is approximate, which is fine for an optimization.
pub struct ResolutionCache {
    inner: Option<Mutex<LruCache<Key, Resolved>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("enabled", &self.inner.is_some())
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl ResolutionCache {
    /// Reference default capacity.
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn lookup(&self, path: &str, method: Method) -> Option<Resolved> {
        let inner = self.inner.as_ref()?;
        let mut guard = lock(inner);
        let found = guard.get(&(path.to_string(), method)).cloned();
        drop(guard);

        match &found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        found
    }

    pub fn insert(&self, path: &str, method: Method, resolved: Resolved) {
        let Some(inner) = self.inner.as_ref() else {
            return;
        };
        let key = (path.to_string(), method);
        let mut guard = lock(inner);
        if let Some((victim, _)) = guard.push(key.clone(), resolved) {
            // push returns the displaced pair: either the old value under
            // the same key (an overwrite) or the LRU victim.
            if victim != key {
                drop(guard);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(
                    target: "waypost::cache",
                    path = %victim.0,
                    method = %victim.1,
                    "Evicted least-recently-used resolution"
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.as_ref() {
            Some(inner) => lock(inner).len(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// A poisoned lock only means another request panicked mid-probe; the
/// cached data itself is still coherent, so keep serving.
fn lock(inner: &Mutex<LruCache<Key, Resolved>>) -> MutexGuard<'_, LruCache<Key, Resolved>> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypost_types::{Handler, PathPattern, RouteResponse};

    fn entry(path: &str) -> Arc<RouteEntry> {
        Arc::new(RouteEntry::new(
            PathPattern::parse(path, "test"),
            Method::Get,
            Handler::new(|_req, _params| async { RouteResponse::new(200) }),
        ))
    }

    fn resolved(path: &str) -> Resolved {
        Resolved {
            entry: entry(path),
            params: Params::new(),
        }
    }

    #[test]
    fn test_lookup_after_insert() {
        let cache = ResolutionCache::new(10);
        assert!(cache.lookup("/a", Method::Get).is_none());

        cache.insert("/a", Method::Get, resolved("/a"));
        let hit = cache.lookup("/a", Method::Get).unwrap();
        assert_eq!(hit.entry.pattern.raw(), "/a");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_method_is_part_of_the_key() {
        let cache = ResolutionCache::new(10);
        cache.insert("/a", Method::Get, resolved("/a"));
        assert!(cache.lookup("/a", Method::Post).is_none());
    }

    #[test]
    fn test_capacity_one_evicts_previous() {
        let cache = ResolutionCache::new(1);
        cache.insert("/a", Method::Get, resolved("/a"));
        cache.insert("/b", Method::Get, resolved("/b"));

        assert!(cache.lookup("/a", Method::Get).is_none());
        assert!(cache.lookup("/b", Method::Get).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lookup_refreshes_recency() {
        let cache = ResolutionCache::new(2);
        cache.insert("/a", Method::Get, resolved("/a"));
        cache.insert("/b", Method::Get, resolved("/b"));

        // Touch /a so /b becomes the victim.
        assert!(cache.lookup("/a", Method::Get).is_some());
        cache.insert("/c", Method::Get, resolved("/c"));

        assert!(cache.lookup("/a", Method::Get).is_some());
        assert!(cache.lookup("/b", Method::Get).is_none());
        assert!(cache.lookup("/c", Method::Get).is_some());
    }

    #[test]
    fn test_overwrite_same_key_is_not_an_eviction() {
        let cache = ResolutionCache::new(2);
        cache.insert("/a", Method::Get, resolved("/a"));
        cache.insert("/a", Method::Get, resolved("/a"));
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = ResolutionCache::new(0);
        cache.insert("/a", Method::Get, resolved("/a"));
        assert!(cache.lookup("/a", Method::Get).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_concurrent_access_is_coherent() {
        let cache = Arc::new(ResolutionCache::new(64));
        let mut handles = Vec::new();
        for t in 0..8 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..200 {
                    let path = format!("/p/{}", (t * 7 + i) % 100);
                    if let Some(hit) = cache.lookup(&path, Method::Get) {
                        assert_eq!(hit.entry.pattern.raw(), path);
                    } else {
                        cache.insert(&path, Method::Get, resolved(&path));
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 64);
    }
}
