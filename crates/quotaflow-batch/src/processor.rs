//! Batch processor implementation.

use crate::config::BatchConfig;
use crate::BatchError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One queued operation: a kind, its payload, and the sinks the outcome
/// is fanned back through.
///
/// Exactly one of the two sinks receives a delivery per operation.
/// Delivery is non-blocking: a full or closed sink drops the delivery
/// (observable through the `on_delivery_dropped` hook), so callers that
/// need every outcome must size their sinks at least as large as the
/// batch size.
pub struct BatchOp<P, R, E> {
    /// Handler key.
    pub kind: String,
    /// Operation input, handed to the kind's handler.
    pub payload: P,
    /// Receives the handler's success value.
    pub result_sink: mpsc::Sender<R>,
    /// Receives the handler's error, or a processor error.
    pub error_sink: mpsc::Sender<BatchError<E>>,
}

/// Coalesces small operations into groups and processes each group in
/// the task that completed it.
///
/// Operations accumulate until `batch_size` is reached; the submit that
/// fills the group drains it and runs the handlers inline. There is no
/// dedicated batching task: pending work is bounded by the batch size
/// and a full consumer channel can never deadlock the processor.
pub struct BatchProcessor<P, R, E> {
    pending: Mutex<Vec<BatchOp<P, R, E>>>,
    config: BatchConfig<P, R, E>,
}

impl<P, R, E> BatchProcessor<P, R, E>
where
    P: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    /// Creates a processor from the given configuration.
    pub fn new(config: BatchConfig<P, R, E>) -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(Vec::with_capacity(config.batch_size)),
            config,
        })
    }

    /// Queues one operation, processing the accumulated group when it
    /// reaches the configured size.
    pub async fn submit(&self, op: BatchOp<P, R, E>) {
        let group = {
            let mut pending = self.pending.lock();
            pending.push(op);
            if pending.len() >= self.config.batch_size {
                Some(std::mem::take(&mut *pending))
            } else {
                None
            }
        };

        if let Some(group) = group {
            self.process_group(group).await;
        }
    }

    /// Forces processing of a partial group.
    pub async fn flush(&self) {
        let group = std::mem::take(&mut *self.pending.lock());
        if !group.is_empty() {
            self.process_group(group).await;
        }
    }

    /// Operations accumulated and not yet processed.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Name of this processor instance.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    async fn process_group(&self, group: Vec<BatchOp<P, R, E>>) {
        let size = group.len();

        #[cfg(feature = "tracing")]
        tracing::debug!(processor = %self.config.name, size, "processing batch group");
        #[cfg(feature = "metrics")]
        metrics::counter!("quotaflow_batch_groups_total", "batch" => self.config.name.clone())
            .increment(1);

        if let Some(hook) = &self.config.hooks.flushed {
            hook(size);
        }

        // Sub-group by kind, preserving arrival order within each kind.
        let mut runs: Vec<(String, Vec<BatchOp<P, R, E>>)> = Vec::new();
        for op in group {
            match runs.iter_mut().find(|(kind, _)| *kind == op.kind) {
                Some((_, ops)) => ops.push(op),
                None => runs.push((op.kind.clone(), vec![op])),
            }
        }

        for (kind, ops) in runs {
            let Some(handler) = self.config.handlers.get(&kind) else {
                for op in ops {
                    if op
                        .error_sink
                        .try_send(BatchError::UnknownKind { kind: kind.clone() })
                        .is_err()
                    {
                        self.emit_dropped(&kind);
                    }
                }
                continue;
            };

            let mut payloads = Vec::with_capacity(ops.len());
            let mut sinks = Vec::with_capacity(ops.len());
            for op in ops {
                payloads.push(op.payload);
                sinks.push((op.result_sink, op.error_sink));
            }

            let mut outcomes = handler(payloads).await.into_iter();

            for (result_sink, error_sink) in sinks {
                let delivered = match outcomes.next() {
                    Some(Ok(value)) => result_sink.try_send(value).is_ok(),
                    Some(Err(err)) => error_sink.try_send(BatchError::Handler(err)).is_ok(),
                    None => error_sink.try_send(BatchError::MissingOutcome).is_ok(),
                };
                if !delivered {
                    self.emit_dropped(&kind);
                }
            }
        }
    }

    fn emit_dropped(&self, kind: &str) {
        #[cfg(feature = "metrics")]
        metrics::counter!("quotaflow_batch_dropped_total", "batch" => self.config.name.clone())
            .increment(1);
        if let Some(hook) = &self.config.hooks.delivery_dropped {
            hook(kind);
        }
    }
}
