//! Run statistics shared between worker tasks and the progress reporter.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters for one bulk run.
///
/// Counters are atomics written by the worker tasks; the progress
/// reporter and any other observer read them through [`BulkStats::snapshot`]
/// and never write.
#[derive(Debug)]
pub struct BulkStats {
    processed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    api_calls: AtomicU64,
    total_size: AtomicU64,
    started_at: Instant,
    last_update_at: Mutex<Instant>,
    current_label: Mutex<String>,
}

impl BulkStats {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        Self {
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            api_calls: AtomicU64::new(0),
            total_size: AtomicU64::new(0),
            started_at: now,
            last_update_at: Mutex::new(now),
            current_label: Mutex::new(String::new()),
        }
    }

    pub(crate) fn record_processed(&self, size: u64) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.total_size.fetch_add(size, Ordering::Relaxed);
        self.touch();
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub(crate) fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub(crate) fn set_label(&self, label: &str) {
        let mut current = self.current_label.lock();
        current.clear();
        current.push_str(label);
    }

    pub(crate) fn current_label(&self) -> String {
        self.current_label.lock().clone()
    }

    fn touch(&self) {
        *self.last_update_at.lock() = Instant::now();
    }

    /// Returns an eventually-consistent value copy of the counters.
    pub fn snapshot(&self) -> BulkSnapshot {
        BulkSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
            total_size: self.total_size.load(Ordering::Relaxed),
            elapsed: self.started_at.elapsed(),
            since_last_update: self.last_update_at.lock().elapsed(),
        }
    }
}

/// Value copy of a run's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkSnapshot {
    /// Items whose action succeeded.
    pub processed: u64,
    /// Items whose action failed after retries.
    pub failed: u64,
    /// Items the skip policy excluded.
    pub skipped: u64,
    /// Listing calls issued.
    pub api_calls: u64,
    /// Sum of sizes returned by successful actions.
    pub total_size: u64,
    /// Time since the run started.
    pub elapsed: Duration,
    /// Time since any counter changed.
    pub since_last_update: Duration,
}

/// Final report of a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    /// Items whose action succeeded.
    pub processed: u64,
    /// Items whose action failed after retries.
    pub failed: u64,
    /// Items the skip policy excluded.
    pub skipped: u64,
    /// Listing calls issued.
    pub api_calls: u64,
    /// Sum of sizes returned by successful actions.
    pub total_size: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
    /// The first task failure observed (in completion order), rendered
    /// for reporting; `None` when every dispatched item succeeded.
    pub first_error: Option<String>,
}
