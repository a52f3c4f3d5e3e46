//! Cache storage implementation.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Entry in the cache with TTL and access tracking.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    last_access_at: Instant,
    access_count: u64,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now + ttl,
            last_access_at: now,
            access_count: 0,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Outcome of a store lookup, distinguished so the wrapper can count it
/// and fire the matching hook.
pub(crate) enum Lookup<V> {
    Hit(V),
    Miss,
    Expired,
}

/// Recency-ordered store with TTL support and hit/miss accounting.
///
/// The recency order is maintained by the underlying `LruCache`: every
/// hit moves the entry to the front, so the entry displaced at capacity
/// is the one with the oldest last access. Entries never accessed since
/// insert keep their insertion order, which makes displacement
/// deterministic.
pub(crate) struct CacheStore<K, V> {
    store: LruCache<K, CacheEntry<V>>,
    ttl: Duration,
    hits: u64,
    misses: u64,
    expired: u64,
    evictions: u64,
}

impl<K: Hash + Eq, V: Clone> CacheStore<K, V> {
    pub(crate) fn new(max_size: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::new(100).unwrap());
        Self {
            store: LruCache::new(cap),
            ttl,
            hits: 0,
            misses: 0,
            expired: 0,
            evictions: 0,
        }
    }

    /// Looks up a key, removing it if expired.
    pub(crate) fn get(&mut self, key: &K) -> Lookup<V> {
        let now = Instant::now();

        let expired = match self.store.get_mut(key) {
            None => {
                self.misses += 1;
                return Lookup::Miss;
            }
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.last_access_at = now;
                entry.access_count += 1;
                let value = entry.value.clone();
                self.hits += 1;
                return Lookup::Hit(value);
            }
        };

        debug_assert!(expired);
        self.store.pop(key);
        self.misses += 1;
        self.expired += 1;
        Lookup::Expired
    }

    /// Inserts a value with `expires_at = now + ttl`.
    ///
    /// Returns true when the insert displaced another key.
    pub(crate) fn insert(&mut self, key: K, value: V) -> bool {
        let entry = CacheEntry::new(value, self.ttl);
        match self.store.push(key, entry) {
            Some((displaced_key, _)) => {
                // push returns the old entry when the key was already
                // present; only a different key counts as an eviction
                let evicted = !self.store.contains(&displaced_key);
                if evicted {
                    self.evictions += 1;
                }
                evicted
            }
            None => false,
        }
    }

    pub(crate) fn invalidate(&mut self, key: &K) -> bool {
        self.store.pop(key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn clear(&mut self) {
        self.store.clear();
    }

    pub(crate) fn counters(&self) -> (u64, u64, u64, u64) {
        (self.hits, self.misses, self.expired, self.evictions)
    }
}
