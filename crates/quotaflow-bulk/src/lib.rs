//! Large-scale bulk operations under a remote quota.
//!
//! [`BulkEngine`] drives thousands of long-running per-item jobs
//! (typically repository clones) against a quota-bound API:
//!
//! - **Listing**: pages through a [`PageSource`] until no `next`/`last`
//!   link relation is announced, with every fetch gated by a shared
//!   [`AdaptiveRateLimiter`](quotaflow_ratelimiter::AdaptiveRateLimiter)
//!   and every response's quota indicators fed back into it.
//! - **Worker pool**: a counting semaphore bounds in-flight actions;
//!   the bound scales down for very large workloads and low memory.
//! - **Retries**: transient action failures back off linearly and
//!   retry up to the configured attempt budget; permanent failures
//!   surface at once. Item failures never abort the run.
//! - **Skip policy**: archived items and oversized items under memory
//!   pressure are skipped without running the action.
//! - **Progress**: a separate timer task reads counter snapshots and
//!   invokes the caller's `(processed, total, current_label)` callback;
//!   it never writes.
//!
//! # Examples
//!
//! ```
//! use quotaflow_bulk::{item_action, ActionError, BulkConfig, BulkEngine, RemoteItem};
//! use quotaflow_ratelimiter::{AdaptiveRateLimiter, RateLimiterConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "multi_thread", worker_threads = 2)]
//! # async fn main() {
//! let limiter = AdaptiveRateLimiter::new(
//!     RateLimiterConfig::builder().name("api.example.com").build(),
//! );
//! let engine = BulkEngine::new(
//!     limiter,
//!     BulkConfig::builder().max_concurrency(8).build(),
//! );
//!
//! let action = item_action(|item: RemoteItem| async move {
//!     // clone --depth 1 ... (elided)
//!     let _ = item;
//!     Ok::<u64, ActionError>(1024)
//! });
//!
//! let items = vec![RemoteItem::new("octo/widgets"), RemoteItem::new("octo/gizmos")];
//! let summary = engine
//!     .run(items, action, None, &CancellationToken::new())
//!     .await;
//! assert_eq!(summary.processed, 2);
//! # }
//! ```

mod config;
mod engine;
mod error;
mod item;
mod memory;
mod page;
mod stats;

pub use config::{BulkConfig, BulkConfigBuilder, SkipPredicate};
pub use engine::{item_action, BulkEngine, ItemAction, ProgressFn};
pub use error::{ActionError, BulkError};
pub use item::RemoteItem;
pub use memory::{FixedMemoryGauge, MemoryGauge, SystemMemoryGauge};
pub use page::{parse_link_relations, PageIndicators, PageResponse, PageSource, PageSourceError};
pub use stats::{BulkSnapshot, BulkStats, BulkSummary};
