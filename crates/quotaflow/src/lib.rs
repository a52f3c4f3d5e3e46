//! Concurrency core for quota-bound remote-API orchestration.
//!
//! `quotaflow` bundles the components needed to drive very large
//! workloads against remote APIs that report their quota in response
//! headers. Each component is available as an individual crate and as a
//! feature of this meta-crate.
//!
//! # Quick start
//!
//! ```toml
//! [dependencies]
//! quotaflow = { version = "0.1", features = ["ratelimiter", "bulk"] }
//! ```
//!
//! # Components
//!
//! - **[Rate limiter]** (`ratelimiter`) — paces outbound calls against
//!   the remote-reported quota: spread over the reset window, buffer
//!   reservation against bursts, recent-frequency backoff, band-based
//!   retuning on every observation, and completion-time estimation.
//! - **[Bulk engine]** (`bulk`) — pages through a listing endpoint and
//!   drives a bounded worker pool over the returned items with retries,
//!   a skip policy, memory-pressure backoff, and a read-only progress
//!   reporter.
//! - **[Pools]** (`pool`) — a keyed connection pool handing out
//!   exclusive RAII handles, and a type-keyed object pool with
//!   triggered GC hints.
//! - **[Cache]** (`cache`) — TTL + LRU keyed result cache with hit-rate
//!   accounting.
//! - **[Batch]** (`batch`) — micro-batch processor coalescing small
//!   homogeneous operations into groups, fanning results back through
//!   non-blocking sinks.
//! - **[Metrics]** (`metrics`) — lock-protected counters with
//!   value-copy snapshots.
//! - **[Optimized manager]** (`optimized`) — a decorator wiring cache,
//!   pools, batching, and metering around any connection manager
//!   without changing its interface or error semantics.
//!
//! [Rate limiter]: quotaflow_ratelimiter
//! [Bulk engine]: quotaflow_bulk
//! [Pools]: quotaflow_pool
//! [Cache]: quotaflow_cache
//! [Batch]: quotaflow_batch
//! [Metrics]: quotaflow_metrics
//! [Optimized manager]: quotaflow_optimized
//!
//! # Composition
//!
//! The pieces are designed to be wired together: the bulk engine gates
//! every remote call through a shared rate limiter and requests GC
//! hints from an object pool; the optimized manager feeds its status
//! reads through the cache and its connects through the batch
//! processor and the metrics recorder. [`quotaflow_core`] supplies the
//! unified error type that lets one call path compose them all, and
//! each component exposes typed `on_*` hooks plus optional
//! `metrics`/`tracing` instrumentation for observability.

pub use quotaflow_core as core;

#[cfg(feature = "batch")]
pub use quotaflow_batch as batch;

#[cfg(feature = "bulk")]
pub use quotaflow_bulk as bulk;

#[cfg(feature = "cache")]
pub use quotaflow_cache as cache;

#[cfg(feature = "metrics")]
pub use quotaflow_metrics as metrics;

#[cfg(feature = "optimized")]
pub use quotaflow_optimized as optimized;

#[cfg(feature = "pool")]
pub use quotaflow_pool as pool;

#[cfg(feature = "ratelimiter")]
pub use quotaflow_ratelimiter as ratelimiter;
