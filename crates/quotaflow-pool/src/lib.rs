//! Resource pooling for quotaflow.
//!
//! Two pools with different shapes:
//!
//! - [`ConnectionPool`]: keyed reuse of expensive handles (connections,
//!   sessions). Each key maps to at most one stored resource; `get`
//!   hands out an exclusive [`PoolHandle`] that releases on drop. The
//!   pool has a fixed capacity and never evicts implicitly — callers
//!   shrink it with [`ConnectionPool::purge`].
//! - [`ObjectPool`]: type-keyed free lists for transient allocations
//!   (request scratch, buffers), with a cleanup trigger that invokes a
//!   host-supplied GC hint on every Nth request.
//!
//! # Examples
//!
//! ```
//! use quotaflow_pool::{ConnectionPool, PoolConfig};
//!
//! let pool: ConnectionPool<String> =
//!     ConnectionPool::new(PoolConfig::builder().max_size(10).build());
//!
//! {
//!     let conn = pool.get("us-east", || "dial: us-east".to_string()).unwrap();
//!     assert_eq!(&*conn, "dial: us-east");
//! } // dropped: released back to the pool
//!
//! // The stored resource is reused; the factory is not called again.
//! let conn = pool.get("us-east", || unreachable!()).unwrap();
//! assert_eq!(pool.stats().recycled, 1);
//! # drop(conn);
//! ```

mod config;
mod connection;
mod object;

pub use config::{PoolConfig, PoolConfigBuilder};
pub use connection::{ConnectionPool, PoolHandle, PoolStats};
pub use object::{ObjectPool, ObjectPoolBuilder};
