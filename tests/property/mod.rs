//! Property-based tests for the quotaflow components.

pub mod cache;
pub mod pool;
pub mod rate_limiter;
