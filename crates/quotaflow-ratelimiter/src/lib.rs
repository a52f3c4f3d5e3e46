//! Adaptive rate limiting against a remote quota.
//!
//! Remote APIs report how many requests remain and when the allowance
//! refills. [`AdaptiveRateLimiter`] paces outbound work against those
//! indicators instead of a locally configured rate:
//!
//! - **Quota spread**: the time to the next reset divided by the usable
//!   remaining quota gives the per-request delay, so the allowance lasts
//!   the whole window.
//! - **Buffer reservation**: a fraction of the remaining quota is held
//!   back for bursts and only spent when nothing else is left.
//! - **Recent-frequency backoff**: when the trailing ten seconds ran
//!   hotter than the configured ceiling, the next delay is multiplied.
//! - **Band retuning**: each observation of the remote quota moves the
//!   ceiling and the reservation to a tier fitting how scarce quota is.
//!
//! # Examples
//!
//! ```
//! use quotaflow_ratelimiter::{AdaptiveRateLimiter, RateLimiterConfig};
//! use std::time::{Duration, SystemTime};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limiter = AdaptiveRateLimiter::new(
//!     RateLimiterConfig::builder()
//!         .max_per_second(10)
//!         .buffer_ratio(0.10)
//!         .name("api.example.com")
//!         .build(),
//! );
//!
//! // Feed every response's quota indicators back in.
//! limiter.observe_response(4999, SystemTime::now() + Duration::from_secs(3600));
//!
//! // Gate each outbound call.
//! let cancel = CancellationToken::new();
//! let grant = limiter.acquire(&cancel).await.unwrap();
//! println!("waited {:?}", grant.waited);
//! # }
//! ```

mod config;
mod error;
mod state;

pub use config::{PacingBand, PacingBands, RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::AcquireError;

use crate::state::RateState;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Proof that a permit was granted, carrying the time spent waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireGrant {
    /// How long the caller waited for the permit.
    pub waited: Duration,
}

/// Value copy of a limiter's pacing state.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterSnapshot {
    /// Remaining quota as last observed (or the configured initial value).
    pub remaining: u64,
    /// Time until the quota is expected to refill.
    pub until_reset: Duration,
    /// Recorded requests currently retained.
    pub history_len: usize,
    /// Requests-per-second ceiling in effect.
    pub max_per_second: u32,
    /// Fraction of quota held in reserve.
    pub buffer_ratio: f64,
    /// Whether band retuning and frequency backoff are enabled.
    pub adaptive: bool,
    /// Requests per second over the trailing ten seconds.
    pub recent_frequency: f64,
}

/// A shared, token-aware scheduler pacing outbound requests.
///
/// Cloning is cheap; clones share the same pacing state, which is how a
/// single endpoint's quota is enforced process-wide.
pub struct AdaptiveRateLimiter {
    state: Arc<Mutex<RateState>>,
    config: Arc<RateLimiterConfig>,
}

impl Clone for AdaptiveRateLimiter {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: Arc::clone(&self.config),
        }
    }
}

impl AdaptiveRateLimiter {
    /// Creates a limiter from the given configuration.
    pub fn new(config: RateLimiterConfig) -> Self {
        let state = RateState::new(&config);
        Self {
            state: Arc::new(Mutex::new(state)),
            config: Arc::new(config),
        }
    }

    /// Waits until it is safe to issue one request, then records it.
    ///
    /// The delay is computed under the lock, the sleep happens outside
    /// it. Cancellation wakes the caller promptly and records nothing.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<AcquireGrant, AcquireError> {
        let started = Instant::now();

        let delay = {
            let mut state = self.state.lock().unwrap();
            let now = Instant::now();
            state.prune_history(now);
            state.compute_delay(now)
        };

        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
                _ = sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }

        self.grant(started)
    }

    /// Non-blocking acquire: records a request only when no wait is
    /// needed, otherwise reports the delay a blocking acquire would have
    /// slept.
    pub fn try_acquire(&self) -> Result<AcquireGrant, AcquireError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            let now = Instant::now();
            state.prune_history(now);
            state.compute_delay(now)
        };

        if delay.is_zero() {
            self.grant(Instant::now())
        } else {
            Err(AcquireError::QuotaExhausted { retry_after: delay })
        }
    }

    fn grant(&self, started: Instant) -> Result<AcquireGrant, AcquireError> {
        {
            let mut state = self.state.lock().unwrap();
            state.record_request(Instant::now());
        }

        let waited = started.elapsed();

        #[cfg(feature = "metrics")]
        metrics::counter!("quotaflow_permits_total", "limiter" => self.config.name.clone())
            .increment(1);

        if let Some(hook) = &self.config.hooks.permit_acquired {
            hook(waited);
        }

        Ok(AcquireGrant { waited })
    }

    /// Applies a response's quota indicators.
    ///
    /// Negative `remaining` values are clamped to zero; `reset_at` is
    /// accepted as given. While adaptive, the observation also retunes
    /// the pacing band.
    pub fn observe_response(&self, remaining: i64, reset_at: SystemTime) {
        let reset_instant = instant_for(reset_at);

        let retuned = {
            let mut state = self.state.lock().unwrap();
            state.observe(remaining, reset_instant)
        };

        let clamped = remaining.max(0) as u64;

        #[cfg(feature = "metrics")]
        metrics::gauge!("quotaflow_quota_remaining", "limiter" => self.config.name.clone())
            .set(clamped as f64);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            limiter = %self.config.name,
            remaining = clamped,
            retuned = retuned.is_some(),
            "quota observed"
        );

        if let Some(hook) = &self.config.hooks.quota_observed {
            hook(clamped);
        }
        if let Some((max_per_second, buffer_ratio)) = retuned {
            if let Some(hook) = &self.config.hooks.retuned {
                hook(max_per_second, buffer_ratio);
            }
        }
    }

    /// Predicts the wall time needed to issue `n` requests under the
    /// current pacing, remaining quota, and hourly refill cycles.
    pub fn estimate_completion(&self, n: u64) -> Duration {
        let state = self.state.lock().unwrap();
        state.estimate_completion(n, Instant::now())
    }

    /// Overrides the pacing knobs.
    ///
    /// Invalid inputs are normalised (`max_per_second` to at least 1,
    /// `buffer_ratio` into `[0, 1]`).
    pub fn configure(&self, max_per_second: u32, buffer_ratio: f64, adaptive: bool) {
        let mut state = self.state.lock().unwrap();
        state.max_per_second = max_per_second.max(1);
        state.buffer_ratio = buffer_ratio.clamp(0.0, 1.0);
        state.adaptive = adaptive;
    }

    /// Wipes the history and restores the configured defaults.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        *state = RateState::new(&self.config);
    }

    /// Returns a value copy of the pacing state.
    pub fn snapshot(&self) -> RateLimiterSnapshot {
        let state = self.state.lock().unwrap();
        let now = Instant::now();
        RateLimiterSnapshot {
            remaining: state.remaining,
            until_reset: state.reset_at.saturating_duration_since(now),
            history_len: state.history.len(),
            max_per_second: state.max_per_second,
            buffer_ratio: state.buffer_ratio,
            adaptive: state.adaptive,
            recent_frequency: state.recent_frequency(now),
        }
    }
}

impl std::fmt::Debug for AdaptiveRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveRateLimiter")
            .field("name", &self.config.name)
            .finish_non_exhaustive()
    }
}

/// Maps a wall-clock reset stamp onto the monotonic clock; stamps in the
/// past collapse to now.
fn instant_for(reset_at: SystemTime) -> Instant {
    let now = Instant::now();
    match reset_at.duration_since(SystemTime::now()) {
        Ok(ahead) => now + ahead,
        Err(_) => now,
    }
}
