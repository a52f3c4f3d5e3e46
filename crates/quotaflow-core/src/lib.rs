//! Core infrastructure for quotaflow.
//!
//! The one piece every quotaflow call path shares: a unified error type
//! so callers composing the rate limiter, the bulk engine, and the
//! optimizer in one job do not write per-component `From` boilerplate.
//!
//! Observability is deliberately not centralised here. Each component
//! exposes typed `on_*` hooks on its config builder for the moments
//! that matter to it (a permit granted, a handle recycled, a group
//! flushed), and mirrors its counters into the `metrics`/`tracing`
//! facades behind the same-named cargo features.

pub mod error;

pub use error::OrchestrationError;
