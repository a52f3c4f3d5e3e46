//! Cross-component wiring: one limiter shared by a bulk engine, GC
//! hints routed to an object pool, and an optimized manager doing the
//! per-item work.

use async_trait::async_trait;
use quotaflow_bulk::{
    item_action, ActionError, BulkConfig, BulkEngine, FixedMemoryGauge, MemoryGauge,
    PageIndicators, PageResponse, PageSource, PageSourceError, RemoteItem,
};
use quotaflow_optimized::{Manager, ManagerError, ManagerStatus, OptimizedManager, OptimizerConfig};
use quotaflow_pool::ObjectPool;
use quotaflow_ratelimiter::{AdaptiveRateLimiter, RateLimiterConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

struct Mirror {
    repos: Vec<RemoteItem>,
}

#[async_trait]
impl PageSource for Mirror {
    async fn fetch(&self, page: usize, per_page: usize) -> Result<PageResponse, PageSourceError> {
        let start = (page - 1) * per_page;
        let end = (start + per_page).min(self.repos.len());
        if start > self.repos.len() {
            return Err(PageSourceError::new("page out of range"));
        }

        let more = end < self.repos.len();
        Ok(PageResponse {
            items: self.repos[start..end].to_vec(),
            indicators: PageIndicators {
                remaining: Some((5000 - page) as i64),
                reset_at: Some(SystemTime::now() + Duration::from_secs(2)),
                link: more.then(|| {
                    format!("<https://api.example.com/repos?page={}>; rel=\"next\"", page + 1)
                }),
            },
        })
    }
}

struct TunnelDaemon;

#[async_trait]
impl Manager for TunnelDaemon {
    async fn connect(&self, _profile: &str) -> Result<(), ManagerError> {
        Ok(())
    }

    async fn disconnect(&self, _profile: &str) -> Result<(), ManagerError> {
        Ok(())
    }

    async fn status(&self) -> Result<ManagerStatus, ManagerError> {
        Ok(ManagerStatus {
            active_connections: 1,
            healthy: true,
            detail: "tunnel up".to_string(),
        })
    }
}

#[tokio::test]
async fn mirror_job_flows_through_every_component() {
    let limiter = AdaptiveRateLimiter::new(
        RateLimiterConfig::builder()
            .initial_remaining(100_000)
            .initial_window(Duration::ZERO)
            .adaptive(false)
            .name("api.example.com")
            .build(),
    );

    // GC hints from the engine land in the scratch pool.
    let scratch = ObjectPool::builder().cleanup_every(1).build();
    let hints = Arc::new(AtomicUsize::new(0));

    let gauge: Arc<dyn MemoryGauge> = Arc::new(FixedMemoryGauge {
        available: 4 << 30,
        used: 700 << 20,
    });
    let pool_for_hint = scratch.clone();
    let hints_probe = Arc::clone(&hints);
    let engine = BulkEngine::new(
        limiter.clone(),
        BulkConfig::builder()
            .memory_gauge(gauge)
            .memory_threshold(512 << 20)
            .page_size(8)
            .max_concurrency(4)
            .gc_hint(move || {
                pool_for_hint.trigger_cleanup();
                hints_probe.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    );

    let source = Mirror {
        repos: (0..25)
            .map(|i| RemoteItem::new(format!("octo/repo-{i}")))
            .collect(),
    };

    // Each item "clones" by connecting a tunnel through the optimized
    // manager first.
    let manager = Arc::new(OptimizedManager::new(
        TunnelDaemon,
        OptimizerConfig::builder().status_ttl(Duration::from_secs(60)).build(),
    ));
    let action_manager = Arc::clone(&manager);
    let action = item_action(move |item: RemoteItem| {
        let manager = Arc::clone(&action_manager);
        async move {
            manager
                .connect("mirror-tunnel")
                .await
                .map_err(|err| ActionError::Transient(err.to_string()))?;
            let status = manager
                .status()
                .await
                .map_err(|err| ActionError::Transient(err.to_string()))?;
            assert!(status.healthy);
            let _ = item;
            Ok(512)
        }
    });

    let summary = engine
        .execute(&source, action, None, &CancellationToken::new())
        .await
        .unwrap();

    // 25 repos at 8 per page: four listing calls, all processed.
    assert_eq!(summary.api_calls, 4);
    assert_eq!(summary.processed, 25);
    assert_eq!(summary.total_size, 25 * 512);

    // Memory stayed above the threshold, so every page break asked for
    // a cleanup; the pool recorded them.
    assert!(hints.load(Ordering::SeqCst) >= 3);
    assert!(scratch.last_cleanup_at().is_some());

    // The per-item work was optimized: a handful of status probes
    // served 25 reads (concurrent first readers may each miss), and
    // every connect was metered.
    assert_eq!(manager.connect_metrics().attempts, 25);
    assert!(manager.cache_stats().hits >= 20);

    // The limiter saw the listing's quota observations.
    assert_eq!(limiter.snapshot().remaining, 5000 - 4);
}
