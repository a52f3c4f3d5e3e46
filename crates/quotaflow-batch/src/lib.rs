//! Micro-batch processing for quotaflow.
//!
//! Many small homogeneous operations (status probes, tunnel checks,
//! config pushes) cost more in per-call overhead than in work. A
//! [`BatchProcessor`] coalesces them: operations accumulate until the
//! configured group size is reached, the group is drained, and each
//! kind's handler processes its payloads together. Results fan back to
//! per-operation sinks with non-blocking delivery.
//!
//! # Examples
//!
//! ```
//! use quotaflow_batch::{BatchConfig, BatchOp, BatchProcessor};
//! use tokio::sync::mpsc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let processor = BatchProcessor::new(
//!     BatchConfig::builder()
//!         .batch_size(2)
//!         .handler("double", |payloads: Vec<u32>| async move {
//!             payloads.into_iter().map(|p| Ok::<_, String>(p * 2)).collect()
//!         })
//!         .build(),
//! );
//!
//! // Sinks sized >= batch_size guarantee delivery.
//! let (result_tx, mut result_rx) = mpsc::channel(2);
//! let (error_tx, _error_rx) = mpsc::channel(2);
//!
//! for payload in [3, 4] {
//!     processor
//!         .submit(BatchOp {
//!             kind: "double".to_string(),
//!             payload,
//!             result_sink: result_tx.clone(),
//!             error_sink: error_tx.clone(),
//!         })
//!         .await;
//! }
//!
//! assert_eq!(result_rx.recv().await, Some(6));
//! assert_eq!(result_rx.recv().await, Some(8));
//! # }
//! ```

mod config;
mod processor;

pub use config::{BatchConfig, BatchConfigBuilder, BatchHandler};
pub use processor::{BatchOp, BatchProcessor};

/// Error delivered to an operation's error sink.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchError<E> {
    /// The kind's handler rejected this operation.
    #[error("handler error: {0}")]
    Handler(E),
    /// No handler is registered for the operation's kind.
    #[error("no handler registered for kind {kind:?}")]
    UnknownKind {
        /// The unhandled kind.
        kind: String,
    },
    /// The handler returned fewer outcomes than payloads.
    #[error("handler returned no outcome for this operation")]
    MissingOutcome,
}
