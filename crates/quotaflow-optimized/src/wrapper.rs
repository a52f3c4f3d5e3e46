//! The decorating wrapper.

use crate::config::OptimizerConfig;
use crate::manager::{Manager, ManagerError, ManagerStatus};
use async_trait::async_trait;
use quotaflow_batch::{BatchConfig, BatchError, BatchOp, BatchProcessor};
use quotaflow_cache::{CacheConfig, CacheStats, ResultCache};
use quotaflow_metrics::{PerfRecorder, PerfSnapshot};
use quotaflow_pool::ObjectPool;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Reusable per-call request scratch drawn from the object pool; its
/// buffer keeps its capacity across calls.
#[derive(Debug, Default)]
struct RequestScratch {
    profile: String,
}

impl RequestScratch {
    fn reset(&mut self, profile: &str) {
        self.profile.clear();
        self.profile.push_str(profile);
    }
}

/// Decorator adding caching, pooling, and metering to a [`Manager`].
///
/// - `status` is served through a TTL cache keyed by operation name;
///   entries expire by TTL only, there is no write-through.
/// - `connect` and `disconnect` are metered (attempt, outcome, latency)
///   and draw their request scratch from an object pool.
/// - `batch_connect` coalesces profiles through a micro-batch
///   processor.
/// - Every operation forwards to the inner manager and returns its
///   results and errors unchanged.
pub struct OptimizedManager<M> {
    inner: Arc<M>,
    status_cache: ResultCache<&'static str, ManagerStatus>,
    scratch: ObjectPool,
    connect_meter: PerfRecorder,
    disconnect_meter: PerfRecorder,
    batch: Arc<BatchProcessor<String, (), ManagerError>>,
}

impl<M> OptimizedManager<M>
where
    M: Manager + 'static,
{
    /// Wraps a manager with the given optimizer configuration.
    pub fn new(inner: M, config: OptimizerConfig) -> Self {
        let inner = Arc::new(inner);
        let connect_meter = PerfRecorder::new("connect");

        let handler_inner = Arc::clone(&inner);
        let handler_meter = connect_meter.clone();
        let batch = BatchProcessor::new(
            BatchConfig::builder()
                .batch_size(config.batch_size)
                .name(format!("{}-connect-batch", config.name))
                .handler("connect", move |profiles: Vec<String>| {
                    let inner = Arc::clone(&handler_inner);
                    let meter = handler_meter.clone();
                    async move {
                        let mut outcomes = Vec::with_capacity(profiles.len());
                        for profile in profiles {
                            let call = meter.begin();
                            match inner.connect(&profile).await {
                                Ok(()) => {
                                    call.success();
                                    outcomes.push(Ok(()));
                                }
                                Err(err) => {
                                    call.failure();
                                    outcomes.push(Err(err));
                                }
                            }
                        }
                        outcomes
                    }
                })
                .build(),
        );

        Self {
            inner,
            status_cache: ResultCache::new(
                CacheConfig::builder()
                    .max_size(config.cache_size)
                    .ttl(config.status_ttl)
                    .name(format!("{}-status-cache", config.name))
                    .build(),
            ),
            scratch: ObjectPool::builder()
                .name(format!("{}-scratch", config.name))
                .build(),
            connect_meter,
            disconnect_meter: PerfRecorder::new("disconnect"),
            batch,
        }
    }

    /// The wrapped manager.
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Counters of the status cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.status_cache.stats()
    }

    /// Metering snapshot for connect operations (direct and batched).
    pub fn connect_metrics(&self) -> PerfSnapshot {
        self.connect_meter.snapshot()
    }

    /// Metering snapshot for disconnect operations.
    pub fn disconnect_metrics(&self) -> PerfSnapshot {
        self.disconnect_meter.snapshot()
    }
}

#[async_trait]
impl<M> Manager for OptimizedManager<M>
where
    M: Manager + 'static,
{
    async fn connect(&self, profile: &str) -> Result<(), ManagerError> {
        let mut scratch: RequestScratch = self.scratch.get(RequestScratch::default);
        scratch.reset(profile);
        #[cfg(feature = "tracing")]
        tracing::debug!(profile = %scratch.profile, "connect");

        let call = self.connect_meter.begin();
        let result = self.inner.connect(profile).await;
        match &result {
            Ok(()) => call.success(),
            Err(_) => call.failure(),
        }

        self.scratch.put(scratch);
        result
    }

    async fn disconnect(&self, profile: &str) -> Result<(), ManagerError> {
        let mut scratch: RequestScratch = self.scratch.get(RequestScratch::default);
        scratch.reset(profile);

        let call = self.disconnect_meter.begin();
        let result = self.inner.disconnect(profile).await;
        match &result {
            Ok(()) => call.success(),
            Err(_) => call.failure(),
        }

        self.scratch.put(scratch);
        result
    }

    async fn status(&self) -> Result<ManagerStatus, ManagerError> {
        if let Some(cached) = self.status_cache.get(&"status") {
            return Ok(cached);
        }

        let status = self.inner.status().await?;
        self.status_cache.set("status", status.clone());
        Ok(status)
    }

    async fn batch_connect(&self, profiles: &[String]) -> Vec<Result<(), ManagerError>> {
        let mut outcomes = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let (result_tx, result_rx) = mpsc::channel(1);
            let (error_tx, error_rx) = mpsc::channel(1);
            self.batch
                .submit(BatchOp {
                    kind: "connect".to_string(),
                    payload: profile.clone(),
                    result_sink: result_tx,
                    error_sink: error_tx,
                })
                .await;
            outcomes.push((result_rx, error_rx));
        }
        self.batch.flush().await;

        outcomes
            .into_iter()
            .map(|(mut result_rx, mut error_rx)| {
                if result_rx.try_recv().is_ok() {
                    Ok(())
                } else {
                    match error_rx.try_recv() {
                        Ok(BatchError::Handler(err)) => Err(err),
                        Ok(other) => Err(ManagerError::Batch {
                            message: other.to_string(),
                        }),
                        Err(_) => Err(ManagerError::Batch {
                            message: "no outcome delivered".to_string(),
                        }),
                    }
                }
            })
            .collect()
    }
}
