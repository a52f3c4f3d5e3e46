//! Configuration for the bulk engine.

use crate::item::RemoteItem;
use crate::memory::{MemoryGauge, SystemMemoryGauge};
use std::sync::Arc;
use std::time::Duration;

/// Predicate returning a reason when an item should be skipped.
pub type SkipPredicate = Arc<dyn Fn(&RemoteItem) -> Option<String> + Send + Sync>;

/// Hooks invoked inline as a run progresses. Item hooks receive the
/// item name; the skip hook also receives the reason.
#[derive(Clone, Default)]
pub(crate) struct BulkHooks {
    pub(crate) page_fetched: Option<Arc<dyn Fn(usize, usize) + Send + Sync>>,
    pub(crate) item_completed: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    pub(crate) item_failed: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    pub(crate) item_skipped: Option<Arc<dyn Fn(&str, &str) + Send + Sync>>,
    pub(crate) memory_pressure: Option<Arc<dyn Fn(u64) + Send + Sync>>,
}

/// Configuration for a [`BulkEngine`](crate::BulkEngine).
pub struct BulkConfig {
    pub(crate) max_concurrency: usize,
    pub(crate) page_size: usize,
    pub(crate) max_retries: u32,
    pub(crate) retry_delay: Duration,
    pub(crate) memory_threshold: u64,
    pub(crate) progress_interval: Duration,
    pub(crate) shallow: bool,
    pub(crate) compression: bool,
    pub(crate) skip_predicate: Option<SkipPredicate>,
    pub(crate) memory_gauge: Arc<dyn MemoryGauge>,
    pub(crate) gc_hint: Option<Arc<dyn Fn() + Send + Sync>>,
    pub(crate) hooks: BulkHooks,
    pub(crate) name: String,
}

impl BulkConfig {
    /// Creates a new builder.
    pub fn builder() -> BulkConfigBuilder {
        BulkConfigBuilder::new()
    }

    /// Whether actions should clone shallowly (`--depth 1`).
    pub fn shallow(&self) -> bool {
        self.shallow
    }

    /// Whether actions should enable transfer compression.
    pub fn compression(&self) -> bool {
        self.compression
    }
}

/// Builder for [`BulkConfig`].
pub struct BulkConfigBuilder {
    max_concurrency: usize,
    page_size: usize,
    max_retries: u32,
    retry_delay: Duration,
    memory_threshold: u64,
    progress_interval: Duration,
    shallow: bool,
    compression: bool,
    skip_predicate: Option<SkipPredicate>,
    memory_gauge: Option<Arc<dyn MemoryGauge>>,
    gc_hint: Option<Arc<dyn Fn() + Send + Sync>>,
    hooks: BulkHooks,
    name: String,
}

impl Default for BulkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_concurrency: 10
    /// - page_size: 100
    /// - max_retries: 3 (attempts, including the first)
    /// - retry_delay: 1 second (scaled linearly by attempt number)
    /// - memory_threshold: 512 MiB
    /// - progress_interval: 1 second
    /// - shallow clones and compression enabled
    /// - memory gauge: the host's real counters
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_concurrency: 10,
            page_size: 100,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            memory_threshold: 512 * 1024 * 1024,
            progress_interval: Duration::from_secs(1),
            shallow: true,
            compression: true,
            skip_predicate: None,
            memory_gauge: None,
            gc_hint: None,
            hooks: BulkHooks::default(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the worker-slot ceiling. Zero is normalised to 1; the
    /// effective value is further scaled by workload size and free
    /// memory at run time.
    pub fn max_concurrency(mut self, concurrency: usize) -> Self {
        self.max_concurrency = concurrency.max(1);
        self
    }

    /// Sets how many items each listing page requests. Zero is
    /// normalised to 1.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Sets the total attempt budget per item, including the first
    /// attempt. Zero is normalised to 1.
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = attempts.max(1);
        self
    }

    /// Sets the backoff unit between attempts; attempt `n` waits
    /// `n × retry_delay`.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the used-memory level (bytes) above which the engine skips
    /// oversized items and requests GC hints between pages.
    pub fn memory_threshold(mut self, bytes: u64) -> Self {
        self.memory_threshold = bytes;
        self
    }

    /// Sets how often the progress callback fires.
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval.max(Duration::from_millis(10));
        self
    }

    /// Whether actions should clone shallowly (`--depth 1`).
    pub fn shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    /// Whether actions should enable transfer compression.
    pub fn compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    /// Adds a skip predicate consulted after the built-in policy
    /// (archived items; oversized items under memory pressure). Return
    /// a reason to skip the item.
    pub fn skip_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RemoteItem) -> Option<String> + Send + Sync + 'static,
    {
        self.skip_predicate = Some(Arc::new(predicate));
        self
    }

    /// Replaces the memory gauge (tests inject fixed readings here).
    pub fn memory_gauge(mut self, gauge: Arc<dyn MemoryGauge>) -> Self {
        self.memory_gauge = Some(gauge);
        self
    }

    /// Supplies the GC hint requested when memory crosses the threshold
    /// between listing pages.
    pub fn gc_hint<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.gc_hint = Some(Arc::new(f));
        self
    }

    /// Sets the name for this engine instance (used in telemetry
    /// labels).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a hook invoked when a listing page is fetched, with
    /// the page number and its item count.
    pub fn on_page_fetched<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.hooks.page_fetched = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when an item completes successfully.
    pub fn on_item_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks.item_completed = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when an item fails for good.
    pub fn on_item_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks.item_failed = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when the skip policy excludes an item,
    /// with the item name and the reason.
    pub fn on_item_skipped<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.hooks.item_skipped = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when used memory crosses the threshold
    /// between pages.
    pub fn on_memory_pressure<F>(mut self, f: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.hooks.memory_pressure = Some(Arc::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BulkConfig {
        BulkConfig {
            max_concurrency: self.max_concurrency,
            page_size: self.page_size,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
            memory_threshold: self.memory_threshold,
            progress_interval: self.progress_interval,
            shallow: self.shallow,
            compression: self.compression,
            skip_predicate: self.skip_predicate,
            memory_gauge: self
                .memory_gauge
                .unwrap_or_else(|| Arc::new(SystemMemoryGauge::new())),
            gc_hint: self.gc_hint,
            hooks: self.hooks,
            name: self.name,
        }
    }
}
