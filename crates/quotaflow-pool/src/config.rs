//! Configuration for the connection pool.

use std::sync::Arc;

/// Hooks invoked inline on pool transitions. Each receives the key of
/// the affected handle; the recycle hook also receives how many times
/// the handle has been acquired.
#[derive(Clone, Default)]
pub(crate) struct PoolHooks {
    pub(crate) created: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    pub(crate) recycled: Option<Arc<dyn Fn(&str, u64) + Send + Sync>>,
    pub(crate) released: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    pub(crate) exhausted: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

/// Configuration for a [`ConnectionPool`](crate::ConnectionPool).
pub struct PoolConfig {
    pub(crate) max_size: usize,
    pub(crate) hooks: PoolHooks,
    pub(crate) name: String,
}

impl PoolConfig {
    /// Creates a new builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }
}

/// Builder for [`PoolConfig`].
pub struct PoolConfigBuilder {
    max_size: usize,
    hooks: PoolHooks,
    name: String,
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_size: 10
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_size: 10,
            hooks: PoolHooks::default(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the maximum number of stored handles.
    ///
    /// Zero is normalised to 1.
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Sets the name for this pool instance (used in telemetry labels).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a hook invoked when a resource is created by the
    /// factory.
    pub fn on_created<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks.created = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when an idle resource is handed out
    /// again, with its key and how many times it has been acquired.
    pub fn on_recycled<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u64) + Send + Sync + 'static,
    {
        self.hooks.recycled = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when a handle is returned to the pool.
    pub fn on_released<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks.released = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when `get` returns `None` because the
    /// pool was at capacity or the requested handle was busy.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks.exhausted = Some(Arc::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> PoolConfig {
        PoolConfig {
            max_size: self.max_size,
            hooks: self.hooks,
            name: self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = PoolConfig::builder().build();
        assert_eq!(config.max_size, 10);
        assert_eq!(config.name, "<unnamed>");
        assert!(config.hooks.exhausted.is_none());
    }

    #[test]
    fn zero_capacity_is_normalised() {
        let config = PoolConfig::builder().max_size(0).build();
        assert_eq!(config.max_size, 1);
    }
}
