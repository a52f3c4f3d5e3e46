//! Keyed connection pool with in-use tracking.

use crate::config::PoolConfig;
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct PoolEntry<T> {
    resource: Arc<T>,
    last_used_at: Instant,
    use_count: u64,
    in_use: bool,
}

struct PoolShared<T> {
    entries: Mutex<HashMap<String, PoolEntry<T>>>,
    created: AtomicU64,
    recycled: AtomicU64,
    config: PoolConfig,
}

/// Value copy of a pool's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Handles currently stored (busy or idle).
    pub size: usize,
    /// Handles currently checked out.
    pub in_use: usize,
    /// Resources built by the factory so far.
    pub created: u64,
    /// Times an idle resource was handed out again.
    pub recycled: u64,
}

/// A keyed pool of expensive reusable resources.
///
/// Each key maps to at most one stored resource. [`ConnectionPool::get`]
/// hands out an exclusive [`PoolHandle`]; dropping the handle returns the
/// resource to the pool. The pool never evicts on its own — stored
/// handles only leave via [`ConnectionPool::purge`].
pub struct ConnectionPool<T> {
    shared: Arc<PoolShared<T>>,
}

impl<T> Clone for ConnectionPool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> ConnectionPool<T> {
    /// Creates a pool from the given configuration.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                entries: Mutex::new(HashMap::new()),
                created: AtomicU64::new(0),
                recycled: AtomicU64::new(0),
                config,
            }),
        }
    }

    /// Acquires the resource stored under `key`, creating it with
    /// `factory` if absent.
    ///
    /// Returns `None` when the keyed resource is already checked out, or
    /// when the key is new and the pool is at capacity — the caller
    /// decides whether to wait or fail. The factory runs under the pool
    /// lock and must not block.
    pub fn get<F>(&self, key: &str, factory: F) -> Option<PoolHandle<T>>
    where
        F: FnOnce() -> T,
    {
        let shared = &self.shared;
        let mut entries = shared.entries.lock();

        if let Some(entry) = entries.get_mut(key) {
            if entry.in_use {
                drop(entries);
                if let Some(hook) = &shared.config.hooks.exhausted {
                    hook(key);
                }
                return None;
            }

            entry.in_use = true;
            entry.use_count += 1;
            entry.last_used_at = Instant::now();
            let use_count = entry.use_count;
            let resource = Arc::clone(&entry.resource);
            drop(entries);

            shared.recycled.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            metrics::counter!("quotaflow_pool_recycled_total", "pool" => shared.config.name.clone())
                .increment(1);
            if let Some(hook) = &shared.config.hooks.recycled {
                hook(key, use_count);
            }

            return Some(PoolHandle {
                shared: Arc::clone(shared),
                key: key.to_string(),
                resource,
            });
        }

        if entries.len() >= shared.config.max_size {
            drop(entries);
            #[cfg(feature = "tracing")]
            tracing::debug!(pool = %shared.config.name, key, "pool at capacity");
            if let Some(hook) = &shared.config.hooks.exhausted {
                hook(key);
            }
            return None;
        }

        let resource = Arc::new(factory());
        entries.insert(
            key.to_string(),
            PoolEntry {
                resource: Arc::clone(&resource),
                last_used_at: Instant::now(),
                use_count: 1,
                in_use: true,
            },
        );
        drop(entries);

        shared.created.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("quotaflow_pool_created_total", "pool" => shared.config.name.clone())
            .increment(1);
        if let Some(hook) = &shared.config.hooks.created {
            hook(key);
        }

        Some(PoolHandle {
            shared: Arc::clone(shared),
            key: key.to_string(),
            resource,
        })
    }

    /// Name of this pool instance.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Drops idle entries whose last use is older than `older_than`.
    ///
    /// Returns how many entries were removed. Busy handles are never
    /// purged.
    pub fn purge(&self, older_than: Duration) -> usize {
        let mut entries = self.shared.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.in_use || entry.last_used_at.elapsed() <= older_than);
        before - entries.len()
    }

    /// Returns a value copy of the pool counters.
    pub fn stats(&self) -> PoolStats {
        let entries = self.shared.entries.lock();
        let in_use = entries.values().filter(|e| e.in_use).count();
        PoolStats {
            size: entries.len(),
            in_use,
            created: self.shared.created.load(Ordering::Relaxed),
            recycled: self.shared.recycled.load(Ordering::Relaxed),
        }
    }
}

/// Exclusive grant on a pooled resource.
///
/// The resource is owned by the holder between `get` and drop; dropping
/// the handle releases it back to the pool and stamps its last use.
pub struct PoolHandle<T> {
    shared: Arc<PoolShared<T>>,
    key: String,
    resource: Arc<T>,
}

impl<T> PoolHandle<T> {
    /// Key this handle is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> Deref for PoolHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.resource
    }
}

impl<T> Drop for PoolHandle<T> {
    fn drop(&mut self) {
        {
            let mut entries = self.shared.entries.lock();
            if let Some(entry) = entries.get_mut(&self.key) {
                entry.in_use = false;
                entry.last_used_at = Instant::now();
            }
        }

        if let Some(hook) = &self.shared.config.hooks.released {
            hook(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use std::sync::atomic::AtomicUsize;

    fn pool(max_size: usize) -> ConnectionPool<String> {
        ConnectionPool::new(PoolConfig::builder().max_size(max_size).build())
    }

    #[test]
    fn reuse_skips_the_factory() {
        let pool = pool(10);
        let factory_calls = AtomicUsize::new(0);

        {
            let handle = pool
                .get("east", || {
                    factory_calls.fetch_add(1, Ordering::SeqCst);
                    "conn-east".to_string()
                })
                .unwrap();
            assert_eq!(&*handle, "conn-east");
        }

        let handle = pool
            .get("east", || {
                factory_calls.fetch_add(1, Ordering::SeqCst);
                unreachable!("must reuse the stored resource")
            })
            .unwrap();
        assert_eq!(&*handle, "conn-east");
        assert_eq!(factory_calls.load(Ordering::SeqCst), 1);

        let stats = pool.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.recycled, 1);
    }

    #[test]
    fn busy_handle_is_not_handed_out_twice() {
        let pool = pool(10);
        let _held = pool.get("k", || "r".to_string()).unwrap();
        assert!(pool.get("k", || "r2".to_string()).is_none());
    }

    #[test]
    fn full_pool_returns_none_for_new_keys() {
        let pool = pool(2);
        let _a = pool.get("a", || "a".to_string()).unwrap();
        let _b = pool.get("b", || "b".to_string()).unwrap();
        assert!(pool.get("c", || "c".to_string()).is_none());
    }

    #[test]
    fn release_makes_the_handle_reusable() {
        let pool = pool(1);
        let handle = pool.get("k", || "r".to_string()).unwrap();
        drop(handle);

        let stats = pool.stats();
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.size, 1);

        assert!(pool.get("k", || unreachable!()).is_some());
    }

    #[test]
    fn purge_drops_only_idle_entries() {
        let pool = pool(10);
        drop(pool.get("idle", || "idle".to_string()).unwrap());
        let _busy = pool.get("busy", || "busy".to_string()).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        let removed = pool.purge(Duration::from_millis(5));

        assert_eq!(removed, 1);
        let stats = pool.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.in_use, 1);
    }

    #[test]
    fn recycle_hook_reports_the_acquisition_count() {
        let last_seen = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&last_seen);

        let pool: ConnectionPool<String> = ConnectionPool::new(
            PoolConfig::builder()
                .max_size(4)
                .on_recycled(move |key, use_count| {
                    assert_eq!(key, "gateway");
                    probe.store(use_count as usize, Ordering::SeqCst);
                })
                .build(),
        );

        for _ in 0..3 {
            drop(pool.get("gateway", || "session".to_string()).unwrap());
        }

        // Third acquisition of the same handle: created once, then
        // recycled with use counts 2 and 3.
        assert_eq!(last_seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhaustion_invokes_the_hook() {
        let exhausted = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&exhausted);

        let pool: ConnectionPool<String> = ConnectionPool::new(
            PoolConfig::builder()
                .max_size(1)
                .on_exhausted(move |_key| {
                    probe.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        );

        let _a = pool.get("a", || "a".to_string()).unwrap();
        assert!(pool.get("b", || "b".to_string()).is_none());
        assert_eq!(exhausted.load(Ordering::SeqCst), 1);
    }
}
