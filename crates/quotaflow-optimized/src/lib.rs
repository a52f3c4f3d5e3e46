//! Optimizing decorator for connection managers.
//!
//! [`OptimizedManager`] wraps any [`Manager`] implementation and routes
//! its operations through the quotaflow performance components without
//! changing the interface:
//!
//! - aggregate `status` snapshots are cached with TTL-only invalidation
//!   ([`quotaflow_cache`]),
//! - `connect`/`disconnect` are metered and draw request scratch from an
//!   object pool ([`quotaflow_metrics`], [`quotaflow_pool`]),
//! - `batch_connect` coalesces profiles through a micro-batch processor
//!   ([`quotaflow_batch`]),
//! - everything else forwards verbatim, errors included.
//!
//! [`ProfileHierarchy`] validates profile inheritance relations at
//! configuration time, rejecting cycles before any traversal runs.
//!
//! # Examples
//!
//! ```
//! use quotaflow_optimized::{Manager, ManagerError, ManagerStatus, OptimizedManager, OptimizerConfig};
//! use async_trait::async_trait;
//!
//! struct Daemon;
//!
//! #[async_trait]
//! impl Manager for Daemon {
//!     async fn connect(&self, _profile: &str) -> Result<(), ManagerError> {
//!         Ok(())
//!     }
//!     async fn disconnect(&self, _profile: &str) -> Result<(), ManagerError> {
//!         Ok(())
//!     }
//!     async fn status(&self) -> Result<ManagerStatus, ManagerError> {
//!         Ok(ManagerStatus { active_connections: 1, healthy: true, detail: String::new() })
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let optimized = OptimizedManager::new(Daemon, OptimizerConfig::default());
//! optimized.connect("eu-west").await.unwrap();
//! let status = optimized.status().await.unwrap(); // cached for the TTL
//! assert!(status.healthy);
//! assert_eq!(optimized.connect_metrics().successes, 1);
//! # }
//! ```

mod config;
mod hierarchy;
mod manager;
mod wrapper;

pub use config::{OptimizerConfig, OptimizerConfigBuilder};
pub use hierarchy::{HierarchyError, ProfileHierarchy};
pub use manager::{Manager, ManagerError, ManagerStatus};
pub use wrapper::OptimizedManager;
