//! Configuration for the batch processor.

use futures::future::BoxFuture;
use hashbrown::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Handler applied to one drained kind-group: receives the payloads in
/// arrival order and returns one outcome per payload.
pub type BatchHandler<P, R, E> =
    Arc<dyn Fn(Vec<P>) -> BoxFuture<'static, Vec<Result<R, E>>> + Send + Sync>;

/// Hooks invoked inline while a group is processed.
#[derive(Clone, Default)]
pub(crate) struct BatchHooks {
    pub(crate) flushed: Option<Arc<dyn Fn(usize) + Send + Sync>>,
    pub(crate) delivery_dropped: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

/// Configuration for a [`BatchProcessor`](crate::BatchProcessor).
pub struct BatchConfig<P, R, E> {
    pub(crate) batch_size: usize,
    pub(crate) handlers: HashMap<String, BatchHandler<P, R, E>>,
    pub(crate) hooks: BatchHooks,
    pub(crate) name: String,
}

impl<P, R, E> BatchConfig<P, R, E> {
    /// Creates a new builder.
    pub fn builder() -> BatchConfigBuilder<P, R, E> {
        BatchConfigBuilder::new()
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder<P, R, E> {
    batch_size: usize,
    handlers: HashMap<String, BatchHandler<P, R, E>>,
    hooks: BatchHooks,
    name: String,
}

impl<P, R, E> Default for BatchConfigBuilder<P, R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, R, E> BatchConfigBuilder<P, R, E> {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - batch_size: 10
    /// - no handlers
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            batch_size: 10,
            handlers: HashMap::new(),
            hooks: BatchHooks::default(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets how many operations accumulate before a group is processed.
    ///
    /// Zero is normalised to 1 (every submit flushes).
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Registers the handler for one operation kind.
    ///
    /// The handler receives the group's payloads in arrival order and
    /// must return one `Result` per payload, in the same order. Missing
    /// trailing results are delivered to the affected operations as
    /// errors.
    pub fn handler<F, Fut>(mut self, kind: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Result<R, E>>> + Send + 'static,
    {
        self.handlers.insert(
            kind.into(),
            Arc::new(move |payloads| {
                let fut: BoxFuture<'static, Vec<Result<R, E>>> = Box::pin(f(payloads));
                fut
            }),
        );
        self
    }

    /// Sets the name for this processor instance (used in telemetry
    /// labels).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a hook invoked when a group is drained and processed,
    /// with the group size.
    pub fn on_flush<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.hooks.flushed = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when a delivery is dropped because the
    /// caller's sink was full or closed, with the operation's kind.
    pub fn on_delivery_dropped<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks.delivery_dropped = Some(Arc::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BatchConfig<P, R, E> {
        BatchConfig {
            batch_size: self.batch_size,
            handlers: self.handlers,
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
        let config: BatchConfig<u32, u32, String> = BatchConfig::builder().build();
        assert_eq!(config.batch_size, 10);
        assert!(config.handlers.is_empty());
        assert!(config.hooks.flushed.is_none());
    }

    #[test]
    fn zero_batch_size_is_normalised() {
        let config: BatchConfig<u32, u32, String> = BatchConfig::builder().batch_size(0).build();
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn handlers_register_by_kind() {
        let config: BatchConfig<u32, u32, String> = BatchConfig::builder()
            .handler("double", |payloads: Vec<u32>| async move {
                payloads.into_iter().map(|p| Ok(p * 2)).collect()
            })
            .build();
        assert!(config.handlers.contains_key("double"));
    }
}
