//! Configuration for the optimized manager wrapper.

use std::time::Duration;

/// Configuration for an [`OptimizedManager`](crate::OptimizedManager).
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub(crate) status_ttl: Duration,
    pub(crate) cache_size: usize,
    pub(crate) batch_size: usize,
    pub(crate) name: String,
}

impl OptimizerConfig {
    /// Creates a new builder.
    pub fn builder() -> OptimizerConfigBuilder {
        OptimizerConfigBuilder::new()
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`OptimizerConfig`].
pub struct OptimizerConfigBuilder {
    status_ttl: Duration,
    cache_size: usize,
    batch_size: usize,
    name: String,
}

impl Default for OptimizerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - status_ttl: 5 seconds
    /// - cache_size: 16
    /// - batch_size: 5
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            status_ttl: Duration::from_secs(5),
            cache_size: 16,
            batch_size: 5,
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets how long a cached status snapshot stays valid. Cached reads
    /// are invalidated by TTL only; there is no write-through.
    pub fn status_ttl(mut self, ttl: Duration) -> Self {
        self.status_ttl = ttl;
        self
    }

    /// Sets the result-cache capacity. Zero is normalised to 1.
    pub fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = size.max(1);
        self
    }

    /// Sets how many batched operations coalesce into one group. Zero
    /// is normalised to 1.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sets the name for this wrapper instance (used in component
    /// names).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OptimizerConfig {
        OptimizerConfig {
            status_ttl: self.status_ttl,
            cache_size: self.cache_size,
            batch_size: self.batch_size,
            name: self.name,
        }
    }
}
