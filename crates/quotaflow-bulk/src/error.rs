//! Error types for the bulk engine.

use quotaflow_core::OrchestrationError;
use quotaflow_ratelimiter::AcquireError;

/// Error returned by a per-item action.
///
/// The engine retries `Transient` failures up to the configured attempt
/// count; `Permanent` failures surface immediately.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActionError {
    /// Worth retrying (network hiccup, remote 5xx, lock contention).
    #[error("transient: {0}")]
    Transient(String),
    /// Retrying cannot help (not found, permission denied, bad input).
    #[error("permanent: {0}")]
    Permanent(String),
}

/// Errors that can occur while running a bulk operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BulkError {
    /// The caller's cancellation token fired.
    #[error("bulk operation cancelled")]
    Cancelled,
    /// A listing page could not be fetched.
    #[error("listing page {page} failed: {message}")]
    Page {
        /// Page number that failed (1-based).
        page: usize,
        /// Source error description.
        message: String,
    },
    /// An item's action failed for good.
    #[error("item {item:?} failed after {attempts} attempt(s): {source}")]
    Item {
        /// Name of the failed item.
        item: String,
        /// Attempts spent, including the first.
        attempts: u32,
        /// The action's final error.
        source: ActionError,
    },
}

impl From<AcquireError> for BulkError {
    fn from(err: AcquireError) -> Self {
        match err {
            // The engine only issues blocking acquires; exhaustion
            // cannot reach here.
            AcquireError::Cancelled | AcquireError::QuotaExhausted { .. } => BulkError::Cancelled,
        }
    }
}

impl<E> From<BulkError> for OrchestrationError<E>
where
    E: From<BulkError>,
{
    fn from(err: BulkError) -> Self {
        let retryable = matches!(
            err,
            BulkError::Page { .. }
                | BulkError::Item {
                    source: ActionError::Transient(_),
                    ..
                }
        );
        match err {
            BulkError::Cancelled => OrchestrationError::Cancelled,
            other if retryable => OrchestrationError::Transient(E::from(other)),
            other => OrchestrationError::Permanent(E::from(other)),
        }
    }
}
