//! Error types for the rate limiter.

use quotaflow_core::OrchestrationError;
use std::time::Duration;

/// Errors that can occur when acquiring a permit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AcquireError {
    /// The caller's cancellation token fired while waiting.
    #[error("acquire cancelled")]
    Cancelled,
    /// Non-blocking acquire found no permit available right now.
    #[error("quota exhausted, retry after {retry_after:?}")]
    QuotaExhausted {
        /// Delay after which the permit is expected to be grantable.
        retry_after: Duration,
    },
}

impl<E> From<AcquireError> for OrchestrationError<E> {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::Cancelled => OrchestrationError::Cancelled,
            AcquireError::QuotaExhausted { retry_after } => OrchestrationError::QuotaExhausted {
                retry_after: Some(retry_after),
            },
        }
    }
}
