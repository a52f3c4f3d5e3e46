//! TTL + LRU result cache with hit-rate accounting.
//!
//! [`ResultCache`] is a keyed store for expensive query results. Every
//! entry expires a fixed TTL after insertion; expired entries are removed
//! the first time they are looked up. When the cache is full an insert
//! displaces the entry with the oldest last access. Hits and misses are
//! counted so callers can reason about whether caching is paying off.
//!
//! # Examples
//!
//! ```
//! use quotaflow_cache::{CacheConfig, ResultCache};
//! use std::time::Duration;
//!
//! let cache: ResultCache<String, u64> = ResultCache::new(
//!     CacheConfig::builder()
//!         .max_size(1000)
//!         .ttl(Duration::from_secs(600))
//!         .name("status")
//!         .build(),
//! );
//!
//! cache.set("cluster-a".to_string(), 42);
//! assert_eq!(cache.get(&"cluster-a".to_string()), Some(42));
//! assert_eq!(cache.get(&"cluster-b".to_string()), None);
//! assert_eq!(cache.stats().hit_rate, 0.5);
//! ```

mod config;
mod store;

pub use config::{CacheConfig, CacheConfigBuilder};

use crate::store::{CacheStore, Lookup};
use serde::Serialize;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Value copy of a cache's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Live entries currently stored.
    pub size: usize,
    /// Lookups that found a live entry.
    pub hits: u64,
    /// Lookups that found nothing usable.
    pub misses: u64,
    /// Misses caused by TTL expiry (subset of `misses`).
    pub expired: u64,
    /// Entries displaced by inserts at capacity.
    pub evictions: u64,
    /// `hits / (hits + misses)`, zero when no lookups happened.
    pub hit_rate: f64,
}

/// A keyed TTL + LRU cache, cheaply cloneable and shared across tasks.
pub struct ResultCache<K, V> {
    store: Arc<Mutex<CacheStore<K, V>>>,
    config: Arc<CacheConfig>,
}

impl<K, V> Clone for ResultCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<K, V> ResultCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Creates a cache from the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let store = CacheStore::new(config.max_size, config.ttl);
        Self {
            store: Arc::new(Mutex::new(store)),
            config: Arc::new(config),
        }
    }

    /// Looks up a key.
    ///
    /// Returns `None` for absent keys and for entries past their TTL;
    /// expired entries are removed as a side effect.
    pub fn get(&self, key: &K) -> Option<V> {
        let lookup = {
            let mut store = self.store.lock().unwrap();
            store.get(key)
        };

        match lookup {
            Lookup::Hit(value) => {
                #[cfg(feature = "metrics")]
                metrics::counter!("quotaflow_cache_hits_total", "cache" => self.config.name.clone())
                    .increment(1);
                if let Some(hook) = &self.config.hooks.hit {
                    hook();
                }
                Some(value)
            }
            Lookup::Miss => {
                #[cfg(feature = "metrics")]
                metrics::counter!("quotaflow_cache_misses_total", "cache" => self.config.name.clone())
                    .increment(1);
                if let Some(hook) = &self.config.hooks.miss {
                    hook();
                }
                None
            }
            Lookup::Expired => {
                #[cfg(feature = "tracing")]
                tracing::debug!(cache = %self.config.name, "entry expired on access");
                #[cfg(feature = "metrics")]
                metrics::counter!("quotaflow_cache_misses_total", "cache" => self.config.name.clone())
                    .increment(1);
                if let Some(hook) = &self.config.hooks.miss {
                    hook();
                }
                None
            }
        }
    }

    /// Inserts a value, stamping its expiry at `now + ttl`.
    pub fn set(&self, key: K, value: V) {
        let evicted = {
            let mut store = self.store.lock().unwrap();
            store.insert(key, value)
        };

        if evicted {
            #[cfg(feature = "metrics")]
            metrics::counter!("quotaflow_cache_evictions_total", "cache" => self.config.name.clone())
                .increment(1);
            if let Some(hook) = &self.config.hooks.eviction {
                hook();
            }
        }
    }

    /// Removes a key ahead of its TTL. Returns true if it was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.store.lock().unwrap().invalidate(key)
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&self) {
        self.store.lock().unwrap().clear();
    }

    /// Name of this cache instance.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    /// Returns true when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a value copy of the counters.
    pub fn stats(&self) -> CacheStats {
        let store = self.store.lock().unwrap();
        let (hits, misses, expired, evictions) = store.counters();
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };
        CacheStats {
            size: store.len(),
            hits,
            misses,
            expired,
            evictions,
            hit_rate,
        }
    }
}
