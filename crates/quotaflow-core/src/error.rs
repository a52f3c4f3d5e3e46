//! Unified error type for composing quotaflow components.
//!
//! Callers that combine the rate limiter, bulk engine, and optimizer in one
//! call path would otherwise write a `From` impl per component error. Using
//! [`OrchestrationError<E>`] as the application error type removes that
//! boilerplate: each component error converts into one of the shared kinds,
//! and the application's own failures ride in `Transient` or `Permanent`.
//!
//! # Pattern matching
//!
//! ```rust
//! use quotaflow_core::OrchestrationError;
//!
//! # #[derive(Debug)]
//! # struct AppError;
//! # impl std::fmt::Display for AppError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { Ok(()) }
//! # }
//! # impl std::error::Error for AppError {}
//! fn handle_error(error: OrchestrationError<AppError>) {
//!     match error {
//!         OrchestrationError::Cancelled => eprintln!("caller cancelled"),
//!         OrchestrationError::QuotaExhausted { retry_after } => {
//!             eprintln!("out of quota, retry after {:?}", retry_after);
//!         }
//!         OrchestrationError::Transient(e) => eprintln!("retryable: {}", e),
//!         OrchestrationError::Permanent(e) => eprintln!("gave up: {}", e),
//!         other => eprintln!("{}", other),
//!     }
//! }
//! ```

use std::time::Duration;

/// Unified error type spanning all quotaflow components.
///
/// `E` is the application's own error type, carried through the
/// `Transient` / `Permanent` variants with its value untouched.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrchestrationError<E> {
    /// The caller's cancellation token fired before the operation finished.
    #[error("operation cancelled")]
    Cancelled,

    /// An operation exceeded its configured time budget.
    #[error("timeout in {component}")]
    Timeout {
        /// Which component gave up waiting.
        component: &'static str,
    },

    /// No quota is available and the caller asked not to wait.
    #[error("quota exhausted")]
    QuotaExhausted {
        /// Delay after which a permit is expected to be available.
        retry_after: Option<Duration>,
    },

    /// A failure the bulk engine is allowed to retry.
    #[error("transient failure: {0}")]
    Transient(E),

    /// A failure surfaced after retries were exhausted, or one that is
    /// not worth retrying at all.
    #[error("permanent failure: {0}")]
    Permanent(E),

    /// Invalid configuration that could not be normalised.
    #[error("configuration error: {message}")]
    Configuration {
        /// What was wrong with the input.
        message: String,
    },
}

impl<E> OrchestrationError<E> {
    /// Returns true if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrchestrationError::Cancelled)
    }

    /// Returns true if this error is a timeout from any component.
    pub fn is_timeout(&self) -> bool {
        matches!(self, OrchestrationError::Timeout { .. })
    }

    /// Returns true if this error reports exhausted quota.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, OrchestrationError::QuotaExhausted { .. })
    }

    /// Returns true if retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestrationError::Transient(_)
                | OrchestrationError::QuotaExhausted { .. }
                | OrchestrationError::Timeout { .. }
        )
    }

    /// Returns the wrapped application error, if any.
    pub fn application_error(&self) -> Option<&E> {
        match self {
            OrchestrationError::Transient(e) | OrchestrationError::Permanent(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the wrapped application error to another type, preserving the
    /// error kind.
    pub fn map_application<F, E2>(self, f: F) -> OrchestrationError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            OrchestrationError::Cancelled => OrchestrationError::Cancelled,
            OrchestrationError::Timeout { component } => OrchestrationError::Timeout { component },
            OrchestrationError::QuotaExhausted { retry_after } => {
                OrchestrationError::QuotaExhausted { retry_after }
            }
            OrchestrationError::Transient(e) => OrchestrationError::Transient(f(e)),
            OrchestrationError::Permanent(e) => OrchestrationError::Permanent(f(e)),
            OrchestrationError::Configuration { message } => {
                OrchestrationError::Configuration { message }
            }
        }
    }
}
