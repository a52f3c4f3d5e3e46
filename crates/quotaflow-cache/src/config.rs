//! Configuration for the result cache.

use std::sync::Arc;
use std::time::Duration;

/// Hooks invoked inline on cache outcomes.
#[derive(Clone, Default)]
pub(crate) struct CacheHooks {
    pub(crate) hit: Option<Arc<dyn Fn() + Send + Sync>>,
    pub(crate) miss: Option<Arc<dyn Fn() + Send + Sync>>,
    pub(crate) eviction: Option<Arc<dyn Fn() + Send + Sync>>,
}

/// Configuration for a [`ResultCache`](crate::ResultCache).
pub struct CacheConfig {
    pub(crate) max_size: usize,
    pub(crate) ttl: Duration,
    pub(crate) hooks: CacheHooks,
    pub(crate) name: String,
}

impl CacheConfig {
    /// Creates a new builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }
}

/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    max_size: usize,
    ttl: Duration,
    hooks: CacheHooks,
    name: String,
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_size: 100
    /// - ttl: 60 seconds
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_size: 100,
            ttl: Duration::from_secs(60),
            hooks: CacheHooks::default(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// When the cache is full, an insert displaces the entry with the
    /// oldest last access. Zero is normalised to the default capacity.
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Sets the time-to-live applied to every inserted entry.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the name for this cache instance (used in telemetry
    /// labels).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a hook invoked when a lookup finds a live entry.
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.hit = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when a lookup finds nothing (including
    /// entries removed because their TTL had passed).
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.miss = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when an insert displaces another entry.
    pub fn on_eviction<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.eviction = Some(Arc::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CacheConfig {
        CacheConfig {
            max_size: self.max_size,
            ttl: self.ttl,
            hooks: self.hooks,
            name: self.name,
        }
    }
}
