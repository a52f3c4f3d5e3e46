//! Pacing state and delay computation.

use crate::config::{PacingBands, RateLimiterConfig};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Window the recent-frequency estimator looks back over.
const RECENT_WINDOW: Duration = Duration::from_secs(10);
/// Requests older than this are pruned from the history.
const HISTORY_MAX_AGE: Duration = Duration::from_secs(3600);
/// Upper bound on retained history entries.
const HISTORY_CAP: usize = 100;
/// Quota refill assumed per reset cycle when estimating completion.
const REFILL_PER_CYCLE: u64 = 5000;
/// Length of one reset cycle.
const CYCLE: Duration = Duration::from_secs(3600);

/// Mutable pacing state, guarded by the limiter's mutex.
#[derive(Debug)]
pub(crate) struct RateState {
    pub(crate) remaining: u64,
    pub(crate) reset_at: Instant,
    pub(crate) last_request_at: Option<Instant>,
    /// Timestamps of recent recorded requests, oldest first.
    pub(crate) history: VecDeque<Instant>,
    pub(crate) max_per_second: u32,
    pub(crate) buffer_ratio: f64,
    pub(crate) backoff_multiplier: f64,
    pub(crate) max_backoff: Duration,
    pub(crate) adaptive: bool,
    pub(crate) bands: PacingBands,
}

impl RateState {
    pub(crate) fn new(config: &RateLimiterConfig) -> Self {
        Self {
            remaining: config.initial_remaining,
            reset_at: Instant::now() + config.initial_window,
            last_request_at: None,
            history: VecDeque::with_capacity(HISTORY_CAP),
            max_per_second: config.max_per_second,
            buffer_ratio: config.buffer_ratio,
            backoff_multiplier: config.backoff_multiplier,
            max_backoff: config.max_backoff,
            adaptive: config.adaptive,
            bands: config.bands,
        }
    }

    /// Requests held in reserve against bursts.
    fn buffer_requests(&self) -> u64 {
        (self.remaining as f64 * self.buffer_ratio).floor() as u64
    }

    /// Quota usable for normal pacing after the buffer reservation.
    fn effective_remaining(&self) -> u64 {
        self.remaining.saturating_sub(self.buffer_requests())
    }

    /// Shortest interval pacing ever allows between two requests.
    fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.max_per_second.max(1) as f64)
    }

    /// Computes how long the next request must wait, measured from `now`.
    ///
    /// The reserved buffer is excluded from normal pacing; when only the
    /// buffer is left it is spread uniformly over the rest of the window.
    /// The `1/max_per_second` floor is a lower bound on the delay and
    /// never shortens the quota spread, so a window cannot issue more
    /// requests than its observed `remaining`.
    pub(crate) fn compute_delay(&self, now: Instant) -> Duration {
        // Pacing is relative to the previous request; a fresh limiter
        // has nothing to space against.
        let Some(last) = self.last_request_at else {
            return Duration::ZERO;
        };

        let until_reset = self.reset_at.saturating_duration_since(now);
        if until_reset.is_zero() {
            return Duration::ZERO;
        }

        let effective = self.effective_remaining();
        let delay = if effective == 0 {
            until_reset / self.buffer_requests().max(1) as u32
        } else {
            let mut base =
                Duration::from_secs_f64(until_reset.as_secs_f64() / effective as f64);
            if self.adaptive && self.recent_frequency(now) > self.max_per_second as f64 {
                base = base.mul_f64(self.backoff_multiplier);
            }
            base.max(self.min_interval()).min(self.max_backoff)
        };

        delay.saturating_sub(now.saturating_duration_since(last))
    }

    /// Requests per second over the trailing ten seconds of history.
    ///
    /// Fewer than two samples yield zero; identical timestamps are read
    /// as a burst and reported as the sample count.
    pub(crate) fn recent_frequency(&self, now: Instant) -> f64 {
        let cutoff = now.checked_sub(RECENT_WINDOW);
        let recent: Vec<Instant> = self
            .history
            .iter()
            .copied()
            .filter(|t| match cutoff {
                Some(cutoff) => *t > cutoff,
                None => true,
            })
            .collect();

        if recent.len() < 2 {
            return 0.0;
        }

        let span = recent[recent.len() - 1].saturating_duration_since(recent[0]);
        if span.is_zero() {
            recent.len() as f64
        } else {
            (recent.len() - 1) as f64 / span.as_secs_f64()
        }
    }

    /// Drops history entries older than an hour and trims to capacity.
    pub(crate) fn prune_history(&mut self, now: Instant) {
        if let Some(cutoff) = now.checked_sub(HISTORY_MAX_AGE) {
            while let Some(&front) = self.history.front() {
                if front < cutoff {
                    self.history.pop_front();
                } else {
                    break;
                }
            }
        }
        while self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
    }

    /// Records a granted request and spends one unit of quota.
    ///
    /// The local decrement keeps the spread honest between remote
    /// observations; the next `observe` overwrites it with the
    /// remote-reported truth.
    pub(crate) fn record_request(&mut self, now: Instant) {
        self.history.push_back(now);
        if self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
        self.last_request_at = Some(now);
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Applies a response's quota indicators.
    ///
    /// Returns the new pacing band when the observation retuned it.
    pub(crate) fn observe(
        &mut self,
        remaining: i64,
        reset_at: Instant,
    ) -> Option<(u32, f64)> {
        self.remaining = remaining.max(0) as u64;
        self.reset_at = reset_at;

        if !self.adaptive {
            return None;
        }

        let band = self.bands.for_remaining(self.remaining);
        if band.max_per_second != self.max_per_second || band.buffer_ratio != self.buffer_ratio {
            self.max_per_second = band.max_per_second;
            self.buffer_ratio = band.buffer_ratio;
            Some((band.max_per_second, band.buffer_ratio))
        } else {
            None
        }
    }

    /// Predicts the wall time needed to issue `n` requests.
    ///
    /// The current window serves its effective remaining at the current
    /// per-request delay; the overflow waits for the reset and is paced
    /// at the hourly refill cycle.
    pub(crate) fn estimate_completion(&self, n: u64, now: Instant) -> Duration {
        if n == 0 {
            return Duration::ZERO;
        }

        let until_reset = self.reset_at.saturating_duration_since(now);
        let cycle_interval = Duration::from_secs_f64(
            CYCLE.as_secs_f64() / REFILL_PER_CYCLE as f64,
        )
        .max(self.min_interval());

        if until_reset.is_zero() {
            // Window already rolled over; assume a fresh refill cycle.
            return cycle_interval * n as u32;
        }

        let capacity = self.effective_remaining();
        let per_request = if capacity == 0 {
            until_reset / self.buffer_requests().max(1) as u32
        } else {
            Duration::from_secs_f64(until_reset.as_secs_f64() / capacity as f64)
                .max(self.min_interval())
        };

        let in_window = n.min(capacity);
        let mut total = per_request * in_window as u32;
        if n > capacity {
            total = total.max(until_reset) + cycle_interval * (n - capacity) as u32;
        }
        total
    }
}
