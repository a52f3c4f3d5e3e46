//! Decorator transparency and optimization scenarios.

use async_trait::async_trait;
use quotaflow_optimized::{
    Manager, ManagerError, ManagerStatus, OptimizedManager, OptimizerConfig, ProfileHierarchy,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Daemon {
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

#[async_trait]
impl Manager for Daemon {
    async fn connect(&self, profile: &str) -> Result<(), ManagerError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if profile == "unroutable" {
            Err(ManagerError::Connect {
                profile: profile.to_string(),
                message: "no gateway".to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn disconnect(&self, _profile: &str) -> Result<(), ManagerError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn status(&self) -> Result<ManagerStatus, ManagerError> {
        let calls = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ManagerStatus {
            active_connections: calls,
            healthy: true,
            detail: format!("probe #{calls}"),
        })
    }
}

fn optimized(ttl: Duration) -> OptimizedManager<Daemon> {
    OptimizedManager::new(
        Daemon::default(),
        OptimizerConfig::builder()
            .status_ttl(ttl)
            .name("wg-tunnel")
            .build(),
    )
}

#[tokio::test]
async fn wrapper_is_transparent_for_results_and_errors() {
    let inner = Daemon::default();
    let direct_err = inner.connect("unroutable").await.unwrap_err();

    let optimized = optimized(Duration::from_secs(60));
    let wrapped_err = optimized.connect("unroutable").await.unwrap_err();

    // The error value is the inner manager's, untouched.
    assert_eq!(direct_err, wrapped_err);

    // A plain operation forwards unchanged too.
    assert!(optimized.connect("eu-west").await.is_ok());
    assert!(optimized.disconnect("eu-west").await.is_ok());
    assert_eq!(optimized.inner().connect_calls.load(Ordering::SeqCst), 2);
    assert_eq!(optimized.inner().disconnect_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_status_reads_hit_the_cache() {
    let optimized = optimized(Duration::from_secs(60));

    let first = optimized.status().await.unwrap();
    for _ in 0..9 {
        assert_eq!(optimized.status().await.unwrap(), first);
    }

    assert_eq!(optimized.inner().status_calls.load(Ordering::SeqCst), 1);
    let stats = optimized.cache_stats();
    assert_eq!(stats.hits, 9);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn status_refreshes_after_the_ttl() {
    let optimized = optimized(Duration::from_millis(30));

    let first = optimized.status().await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    let second = optimized.status().await.unwrap();

    assert_ne!(first, second);
    assert_eq!(optimized.inner().status_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn connect_class_operations_are_metered() {
    let optimized = optimized(Duration::from_secs(60));

    optimized.connect("eu-west").await.unwrap();
    optimized.connect("unroutable").await.unwrap_err();
    optimized.disconnect("eu-west").await.unwrap();

    let connect = optimized.connect_metrics();
    assert_eq!(connect.attempts, 2);
    assert_eq!(connect.successes, 1);
    assert_eq!(connect.failures, 1);
    assert!(connect.average_latency <= Duration::from_secs(1));

    assert_eq!(optimized.disconnect_metrics().attempts, 1);
}

#[tokio::test]
async fn batch_connect_coalesces_and_keeps_order() {
    let optimized = optimized(Duration::from_secs(60));

    let profiles: Vec<String> = (0..7).map(|i| format!("site-{i}")).collect();
    let results = optimized.batch_connect(&profiles).await;

    assert_eq!(results.len(), 7);
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(optimized.inner().connect_calls.load(Ordering::SeqCst), 7);
    assert_eq!(optimized.connect_metrics().attempts, 7);
}

#[test]
fn hierarchies_are_validated_before_use() {
    let mut hierarchy = ProfileHierarchy::new();
    hierarchy.insert("base", Vec::<String>::new());
    hierarchy.insert("eu", ["base"]);
    hierarchy.insert("eu-west", ["eu"]);
    assert!(hierarchy.validate().is_ok());
    assert_eq!(hierarchy.ancestors("eu-west"), vec!["eu", "base"]);

    hierarchy.insert("base", ["eu-west"]);
    assert!(hierarchy.validate().is_err());
}
