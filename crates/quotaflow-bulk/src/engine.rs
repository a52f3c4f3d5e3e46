//! Bulk engine implementation.

use crate::config::BulkConfig;
use crate::error::{ActionError, BulkError};
use crate::item::RemoteItem;
use crate::page::{has_more_pages, PageSource};
use crate::stats::{BulkSnapshot, BulkStats, BulkSummary};
use futures::future::BoxFuture;
use quotaflow_ratelimiter::AdaptiveRateLimiter;
use std::future::Future;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Items above this size are skipped while used memory is above the
/// configured threshold.
const LARGE_ITEM_BYTES: u64 = 1024 * 1024 * 1024;
/// Workloads above this many items cap the worker slots.
const LARGE_WORKLOAD_ITEMS: usize = 1000;
const LARGE_WORKLOAD_CAP: usize = 10;
/// Available memory below this caps the worker slots harder.
const LOW_MEMORY_BYTES: u64 = 100 * 1024 * 1024;
const LOW_MEMORY_CAP: usize = 5;

/// Per-item action injected by the caller; returns the bytes written.
pub type ItemAction =
    Arc<dyn Fn(RemoteItem) -> BoxFuture<'static, Result<u64, ActionError>> + Send + Sync>;

/// Progress callback: `(processed, total, current_label)`, invoked from
/// the progress timer task.
pub type ProgressFn = Arc<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Wraps an async closure into an [`ItemAction`].
pub fn item_action<F, Fut>(f: F) -> ItemAction
where
    F: Fn(RemoteItem) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<u64, ActionError>> + Send + 'static,
{
    Arc::new(move |item| {
        let fut: BoxFuture<'static, Result<u64, ActionError>> = Box::pin(f(item));
        fut
    })
}

/// Drives a paginated listing and a bounded worker pool over its items,
/// gating every remote call through a shared rate limiter.
pub struct BulkEngine {
    limiter: AdaptiveRateLimiter,
    config: Arc<BulkConfig>,
    stats: Arc<BulkStats>,
}

impl BulkEngine {
    /// Creates an engine. One engine corresponds to one bulk job; its
    /// counters accumulate across `list_all` and `run`.
    pub fn new(limiter: AdaptiveRateLimiter, config: BulkConfig) -> Self {
        Self {
            limiter,
            config: Arc::new(config),
            stats: Arc::new(BulkStats::new()),
        }
    }

    /// The rate limiter gating this engine's remote calls.
    pub fn limiter(&self) -> &AdaptiveRateLimiter {
        &self.limiter
    }

    /// Name of this engine instance.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns an eventually-consistent copy of the run counters.
    pub fn snapshot(&self) -> BulkSnapshot {
        self.stats.snapshot()
    }

    /// Pages through a listing endpoint until no further pages are
    /// announced, feeding quota indicators back into the limiter.
    ///
    /// Every fetch is preceded by a limiter acquire. Between pages, a
    /// crossed memory threshold requests the configured GC hint.
    pub async fn list_all(
        &self,
        source: &dyn PageSource,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteItem>, BulkError> {
        let mut all = Vec::new();
        let mut page = 1usize;

        loop {
            self.limiter.acquire(cancel).await?;

            let response = source
                .fetch(page, self.config.page_size)
                .await
                .map_err(|err| BulkError::Page {
                    page,
                    message: err.message,
                })?;
            self.stats.record_api_call();

            let indicators = &response.indicators;
            match (indicators.remaining, indicators.reset_at) {
                (Some(remaining), Some(reset_at)) => {
                    self.limiter.observe_response(remaining, reset_at);
                }
                (Some(remaining), None) => {
                    let until_reset = self.limiter.snapshot().until_reset;
                    self.limiter
                        .observe_response(remaining, SystemTime::now() + until_reset);
                }
                (None, Some(reset_at)) => {
                    let remaining = self.limiter.snapshot().remaining;
                    self.limiter.observe_response(remaining as i64, reset_at);
                }
                (None, None) => {}
            }

            let count = response.items.len();
            #[cfg(feature = "tracing")]
            tracing::debug!(engine = %self.config.name, page, items = count, "page fetched");
            if let Some(hook) = &self.config.hooks.page_fetched {
                hook(page, count);
            }

            if count == 0 {
                break;
            }
            all.extend(response.items);

            let used = self.config.memory_gauge.used();
            if used > self.config.memory_threshold {
                if let Some(hook) = &self.config.hooks.memory_pressure {
                    hook(used);
                }
                if let Some(hint) = &self.config.gc_hint {
                    hint();
                }
            }

            let more = indicators
                .link
                .as_deref()
                .map(has_more_pages)
                .unwrap_or(false);
            if !more {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    /// Processes every item through the action under a bounded worker
    /// pool, with retries and the skip policy applied.
    ///
    /// Item failures do not abort the run; cancellation stops dispatch
    /// and is reported in the summary. The first task failure (in
    /// completion order) is carried in `first_error`.
    pub async fn run(
        &self,
        items: Vec<RemoteItem>,
        action: ItemAction,
        progress: Option<ProgressFn>,
        cancel: &CancellationToken,
    ) -> BulkSummary {
        let started = Instant::now();
        let total = items.len() as u64;
        let concurrency = self.effective_concurrency(items.len());
        let semaphore = Arc::new(Semaphore::new(concurrency));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            engine = %self.config.name,
            items = items.len(),
            concurrency,
            "bulk run starting"
        );

        let progress_task = progress.map(|callback| {
            let stats = Arc::clone(&self.stats);
            let interval = self.config.progress_interval;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    let snapshot = stats.snapshot();
                    callback(snapshot.processed, total, &stats.current_label());
                }
            })
        });

        let mut join_set: JoinSet<Result<(), BulkError>> = JoinSet::new();
        let mut cancelled = false;

        for item in items {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            if let Some(reason) = self.skip_reason(&item) {
                self.stats.record_skipped();
                if let Some(hook) = &self.config.hooks.item_skipped {
                    hook(&item.name, &reason);
                }
                continue;
            }

            let permit = tokio::select! {
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    }
                }
            };

            self.stats.set_label(&item.name);

            let stats = Arc::clone(&self.stats);
            let config = Arc::clone(&self.config);
            let action = Arc::clone(&action);
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let _permit = permit;
                match run_item(&item, &action, &config, &cancel).await {
                    Ok((size, _attempts)) => {
                        stats.record_processed(size);
                        #[cfg(feature = "metrics")]
                        metrics::counter!("quotaflow_bulk_processed_total", "engine" => config.name.clone())
                            .increment(1);
                        if let Some(hook) = &config.hooks.item_completed {
                            hook(&item.name);
                        }
                        Ok(())
                    }
                    Err(BulkError::Cancelled) => Err(BulkError::Cancelled),
                    Err(err) => {
                        stats.record_failed();
                        #[cfg(feature = "metrics")]
                        metrics::counter!("quotaflow_bulk_failed_total", "engine" => config.name.clone())
                            .increment(1);
                        if let Some(hook) = &config.hooks.item_failed {
                            hook(&item.name);
                        }
                        Err(err)
                    }
                }
            });
        }

        let mut first_error: Option<BulkError> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(join_err) => {
                    self.stats.record_failed();
                    if first_error.is_none() {
                        first_error = Some(BulkError::Item {
                            item: "<worker>".to_string(),
                            attempts: 1,
                            source: ActionError::Permanent(join_err.to_string()),
                        });
                    }
                }
            }
        }

        if let Some(handle) = progress_task {
            handle.abort();
        }

        if cancelled && first_error.is_none() {
            first_error = Some(BulkError::Cancelled);
        }

        let snapshot = self.stats.snapshot();
        BulkSummary {
            processed: snapshot.processed,
            failed: snapshot.failed,
            skipped: snapshot.skipped,
            api_calls: snapshot.api_calls,
            total_size: snapshot.total_size,
            elapsed: started.elapsed(),
            first_error: first_error.map(|err| err.to_string()),
        }
    }

    /// Lists every item, then runs the action over them.
    pub async fn execute(
        &self,
        source: &dyn PageSource,
        action: ItemAction,
        progress: Option<ProgressFn>,
        cancel: &CancellationToken,
    ) -> Result<BulkSummary, BulkError> {
        let items = self.list_all(source, cancel).await?;
        Ok(self.run(items, action, progress, cancel).await)
    }

    /// Worker slots for a workload: the configured ceiling, scaled down
    /// for very large workloads and for low available memory, floor 1.
    fn effective_concurrency(&self, total_items: usize) -> usize {
        let mut slots = self.config.max_concurrency.min(total_items.max(1));
        if total_items > LARGE_WORKLOAD_ITEMS {
            slots = slots.min(LARGE_WORKLOAD_CAP);
        }
        if self.config.memory_gauge.available() < LOW_MEMORY_BYTES {
            slots = slots.min(LOW_MEMORY_CAP);
        }
        slots.max(1)
    }

    /// Why an item should be skipped, or `None` to process it.
    fn skip_reason(&self, item: &RemoteItem) -> Option<String> {
        if item.archived {
            return Some("archived".to_string());
        }
        if item.size_bytes > LARGE_ITEM_BYTES
            && self.config.memory_gauge.used() > self.config.memory_threshold
        {
            return Some("oversized under memory pressure".to_string());
        }
        if let Some(predicate) = &self.config.skip_predicate {
            return predicate(item);
        }
        None
    }
}

/// Runs one item's action with linear-backoff retries of transient
/// failures. Returns the reported size and the attempts spent. No lock
/// is held here: the action and the backoff sleeps run permit-only.
async fn run_item(
    item: &RemoteItem,
    action: &ItemAction,
    config: &BulkConfig,
    cancel: &CancellationToken,
) -> Result<(u64, u32), BulkError> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match action(item.clone()).await {
            Ok(size) => return Ok((size, attempt)),
            Err(ActionError::Permanent(message)) => {
                return Err(BulkError::Item {
                    item: item.name.clone(),
                    attempts: attempt,
                    source: ActionError::Permanent(message),
                });
            }
            Err(ActionError::Transient(message)) => {
                if attempt >= config.max_retries {
                    return Err(BulkError::Item {
                        item: item.name.clone(),
                        attempts: attempt,
                        source: ActionError::Transient(message),
                    });
                }
                let backoff = config.retry_delay * attempt;
                tokio::select! {
                    _ = cancel.cancelled() => return Err(BulkError::Cancelled),
                    _ = sleep(backoff) => {}
                }
            }
        }
    }
}
