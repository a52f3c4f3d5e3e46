//! Type-keyed object pool for transient allocations.

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

type GcHint = Arc<dyn Fn() + Send + Sync>;

struct ObjectPoolShared {
    free: Mutex<HashMap<TypeId, Vec<Box<dyn Any + Send>>>>,
    last_cleanup_at: Mutex<Option<Instant>>,
    cleanup_calls: AtomicU64,
    max_idle_per_type: usize,
    cleanup_every: u64,
    gc_hint: Option<GcHint>,
    name: String,
}

/// A pool of reusable transient objects, keyed by type.
///
/// `get` hands back a previously returned object of the requested type
/// when one is available, otherwise builds a fresh one. Returned objects
/// should be reset by the caller before reuse.
pub struct ObjectPool {
    shared: Arc<ObjectPoolShared>,
}

impl Clone for ObjectPool {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl ObjectPool {
    /// Creates a builder.
    pub fn builder() -> ObjectPoolBuilder {
        ObjectPoolBuilder::new()
    }

    /// Takes an object of type `T` from the free list, or builds one.
    pub fn get<T, F>(&self, factory: F) -> T
    where
        T: Send + 'static,
        F: FnOnce() -> T,
    {
        let reused = {
            let mut free = self.shared.free.lock();
            free.get_mut(&TypeId::of::<T>()).and_then(|list| list.pop())
        };

        match reused {
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(obj) => *obj,
                // Free lists are keyed by TypeId, so this cannot happen
                Err(_) => factory(),
            },
            None => factory(),
        }
    }

    /// Offers an object back to its type's free list.
    ///
    /// The object is dropped instead when the free list is at its
    /// per-type cap.
    pub fn put<T>(&self, obj: T)
    where
        T: Send + 'static,
    {
        let mut free = self.shared.free.lock();
        let list = free.entry(TypeId::of::<T>()).or_default();
        if list.len() < self.shared.max_idle_per_type {
            list.push(Box::new(obj));
        }
    }

    /// Records a cleanup request.
    ///
    /// Stamps the last-cleanup time on every call; every Nth call
    /// (configured by `cleanup_every`) additionally invokes the host's
    /// GC hint, when one was supplied. Safe to call from any task.
    pub fn trigger_cleanup(&self) {
        *self.shared.last_cleanup_at.lock() = Some(Instant::now());

        let calls = self.shared.cleanup_calls.fetch_add(1, Ordering::Relaxed) + 1;
        if calls % self.shared.cleanup_every != 0 {
            return;
        }

        if let Some(hint) = &self.shared.gc_hint {
            #[cfg(feature = "tracing")]
            tracing::debug!(pool = %self.shared.name, calls, "invoking gc hint");
            hint();
        }
    }

    /// Name of this pool instance.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// When the most recent cleanup request was recorded.
    pub fn last_cleanup_at(&self) -> Option<Instant> {
        *self.shared.last_cleanup_at.lock()
    }

    /// Number of idle objects stored for type `T`.
    pub fn idle_count<T: 'static>(&self) -> usize {
        self.shared
            .free
            .lock()
            .get(&TypeId::of::<T>())
            .map(|list| list.len())
            .unwrap_or(0)
    }
}

/// Builder for [`ObjectPool`].
pub struct ObjectPoolBuilder {
    max_idle_per_type: usize,
    cleanup_every: u64,
    gc_hint: Option<GcHint>,
    name: String,
}

impl Default for ObjectPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectPoolBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_idle_per_type: 32
    /// - cleanup_every: 10
    /// - gc_hint: none
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_idle_per_type: 32,
            cleanup_every: 10,
            gc_hint: None,
            name: "<unnamed>".to_string(),
        }
    }

    /// Caps how many idle objects are kept per type; excess offers are
    /// dropped. Zero is normalised to 1.
    pub fn max_idle_per_type(mut self, cap: usize) -> Self {
        self.max_idle_per_type = cap.max(1);
        self
    }

    /// Invoke the GC hint on every Nth cleanup request. Zero is
    /// normalised to 1 (every request).
    pub fn cleanup_every(mut self, n: u64) -> Self {
        self.cleanup_every = n.max(1);
        self
    }

    /// Supplies the host's GC hint, invoked from `trigger_cleanup` on
    /// every Nth request.
    pub fn gc_hint<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.gc_hint = Some(Arc::new(f));
        self
    }

    /// Sets the name for this pool instance (used in telemetry labels).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the pool.
    pub fn build(self) -> ObjectPool {
        ObjectPool {
            shared: Arc::new(ObjectPoolShared {
                free: Mutex::new(HashMap::new()),
                last_cleanup_at: Mutex::new(None),
                cleanup_calls: AtomicU64::new(0),
                max_idle_per_type: self.max_idle_per_type,
                cleanup_every: self.cleanup_every,
                gc_hint: self.gc_hint,
                name: self.name,
            }),
        }
    }
}
