//! Performance counters for quotaflow components.
//!
//! [`PerfRecorder`] tracks attempts, successes, failures, and aggregate
//! latency for one class of operations (e.g. every `connect` issued through
//! an optimized manager). Counters are monotonic, updates take the internal
//! lock, and [`PerfRecorder::snapshot`] returns a value copy taken under
//! that lock — observers never hold a reference into live state.
//!
//! # Examples
//!
//! ```
//! use quotaflow_metrics::PerfRecorder;
//! use std::time::Duration;
//!
//! let recorder = PerfRecorder::new("connect");
//! recorder.record_attempt();
//! recorder.record_success(Duration::from_millis(120));
//!
//! let snap = recorder.snapshot();
//! assert_eq!(snap.attempts, 1);
//! assert_eq!(snap.successes, 1);
//! assert_eq!(snap.average_latency, Duration::from_millis(120));
//! ```

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct PerfState {
    attempts: u64,
    successes: u64,
    failures: u64,
    total_latency: Duration,
    last_attempt_at: Option<Instant>,
}

/// Value copy of a recorder's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerfSnapshot {
    /// Operations started.
    pub attempts: u64,
    /// Operations that completed successfully.
    pub successes: u64,
    /// Operations that completed with an error.
    pub failures: u64,
    /// Sum of recorded latencies.
    pub total_latency: Duration,
    /// `total_latency / attempts`, zero when no attempts were recorded.
    pub average_latency: Duration,
    /// Time since the most recent attempt, if any.
    pub since_last_attempt: Option<Duration>,
}

/// Lock-protected counters for one operation class.
///
/// Cloning is cheap and clones share the same counters.
#[derive(Clone)]
pub struct PerfRecorder {
    name: Arc<str>,
    state: Arc<Mutex<PerfState>>,
}

impl PerfRecorder {
    /// Creates a recorder named for the operation class it observes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            state: Arc::new(Mutex::new(PerfState::default())),
        }
    }

    /// Returns the operation-class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records the start of an operation.
    pub fn record_attempt(&self) {
        let mut state = self.state.lock();
        state.attempts += 1;
        state.last_attempt_at = Some(Instant::now());

        #[cfg(feature = "metrics")]
        metrics::counter!("quotaflow_op_attempts_total", "op" => self.name.to_string())
            .increment(1);
    }

    /// Records a successful completion and its latency.
    pub fn record_success(&self, latency: Duration) {
        let mut state = self.state.lock();
        state.successes += 1;
        state.total_latency += latency;

        #[cfg(feature = "metrics")]
        {
            metrics::counter!("quotaflow_op_successes_total", "op" => self.name.to_string())
                .increment(1);
            metrics::histogram!("quotaflow_op_latency_seconds", "op" => self.name.to_string())
                .record(latency.as_secs_f64());
        }
    }

    /// Records a failed completion and its latency.
    pub fn record_failure(&self, latency: Duration) {
        let mut state = self.state.lock();
        state.failures += 1;
        state.total_latency += latency;

        #[cfg(feature = "metrics")]
        {
            metrics::counter!("quotaflow_op_failures_total", "op" => self.name.to_string())
                .increment(1);
            metrics::histogram!("quotaflow_op_latency_seconds", "op" => self.name.to_string())
                .record(latency.as_secs_f64());
        }
    }

    /// Begins a measured call: the attempt is recorded now, the outcome
    /// when the guard is resolved.
    pub fn begin(&self) -> MeasuredCall {
        self.record_attempt();
        MeasuredCall {
            recorder: self.clone(),
            started_at: Instant::now(),
        }
    }

    /// Returns a value copy of the current counters.
    pub fn snapshot(&self) -> PerfSnapshot {
        let state = self.state.lock();
        let average_latency = if state.attempts > 0 {
            state.total_latency / state.attempts as u32
        } else {
            Duration::ZERO
        };
        PerfSnapshot {
            attempts: state.attempts,
            successes: state.successes,
            failures: state.failures,
            total_latency: state.total_latency,
            average_latency,
            since_last_attempt: state.last_attempt_at.map(|t| t.elapsed()),
        }
    }
}

impl std::fmt::Debug for PerfRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfRecorder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// In-flight measurement started by [`PerfRecorder::begin`].
///
/// Resolve it with [`MeasuredCall::success`] or [`MeasuredCall::failure`];
/// dropping it unresolved records nothing beyond the attempt.
pub struct MeasuredCall {
    recorder: PerfRecorder,
    started_at: Instant,
}

impl MeasuredCall {
    /// Records a success with the elapsed latency.
    pub fn success(self) {
        self.recorder.record_success(self.started_at.elapsed());
    }

    /// Records a failure with the elapsed latency.
    pub fn failure(self) {
        self.recorder.record_failure(self.started_at.elapsed());
    }

    /// Elapsed time since the call began.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
