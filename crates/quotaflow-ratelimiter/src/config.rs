//! Configuration for the adaptive rate limiter.

use std::sync::Arc;
use std::time::Duration;

/// One pacing tier: the request-rate ceiling and buffer reservation
/// applied while the remote quota sits in the tier's range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingBand {
    /// Requests-per-second ceiling.
    pub max_per_second: u32,
    /// Fraction of the remaining quota held in reserve.
    pub buffer_ratio: f64,
}

/// The retune table applied on every quota observation while adaptive
/// pacing is enabled: scarce quota slows down and reserves less.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingBands {
    /// Applies when remaining < `low_threshold`.
    pub low: PacingBand,
    /// Remaining below this is the low tier.
    pub low_threshold: u64,
    /// Applies when remaining < `mid_threshold`.
    pub mid: PacingBand,
    /// Remaining below this (and at least `low_threshold`) is the mid tier.
    pub mid_threshold: u64,
    /// Applies otherwise.
    pub high: PacingBand,
}

impl Default for PacingBands {
    fn default() -> Self {
        Self {
            low: PacingBand {
                max_per_second: 2,
                buffer_ratio: 0.05,
            },
            low_threshold: 100,
            mid: PacingBand {
                max_per_second: 5,
                buffer_ratio: 0.08,
            },
            mid_threshold: 500,
            high: PacingBand {
                max_per_second: 10,
                buffer_ratio: 0.10,
            },
        }
    }
}

impl PacingBands {
    /// Selects the band for an observed remaining quota.
    pub fn for_remaining(&self, remaining: u64) -> PacingBand {
        if remaining < self.low_threshold {
            self.low
        } else if remaining < self.mid_threshold {
            self.mid
        } else {
            self.high
        }
    }
}

/// Hooks invoked inline at the limiter's decision points.
#[derive(Clone, Default)]
pub(crate) struct PacingHooks {
    pub(crate) permit_acquired: Option<Arc<dyn Fn(Duration) + Send + Sync>>,
    pub(crate) quota_observed: Option<Arc<dyn Fn(u64) + Send + Sync>>,
    pub(crate) retuned: Option<Arc<dyn Fn(u32, f64) + Send + Sync>>,
}

/// Configuration for an [`AdaptiveRateLimiter`](crate::AdaptiveRateLimiter).
pub struct RateLimiterConfig {
    pub(crate) max_per_second: u32,
    pub(crate) buffer_ratio: f64,
    pub(crate) backoff_multiplier: f64,
    pub(crate) max_backoff: Duration,
    pub(crate) adaptive: bool,
    pub(crate) initial_remaining: u64,
    pub(crate) initial_window: Duration,
    pub(crate) bands: PacingBands,
    pub(crate) hooks: PacingHooks,
    pub(crate) name: String,
}

impl RateLimiterConfig {
    /// Creates a new builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder {
    max_per_second: u32,
    buffer_ratio: f64,
    backoff_multiplier: f64,
    max_backoff: Duration,
    adaptive: bool,
    initial_remaining: u64,
    initial_window: Duration,
    bands: PacingBands,
    hooks: PacingHooks,
    name: String,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_per_second: 10
    /// - buffer_ratio: 0.10
    /// - backoff_multiplier: 2.0
    /// - max_backoff: 60 seconds
    /// - adaptive: true
    /// - initial quota: 5000 remaining, resetting in one hour
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_per_second: 10,
            buffer_ratio: 0.10,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(60),
            adaptive: true,
            initial_remaining: 5000,
            initial_window: Duration::from_secs(3600),
            bands: PacingBands::default(),
            hooks: PacingHooks::default(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the requests-per-second ceiling. Zero is normalised to 1.
    pub fn max_per_second(mut self, rate: u32) -> Self {
        self.max_per_second = rate.max(1);
        self
    }

    /// Sets the fraction of remaining quota reserved against bursts.
    /// Clamped to `[0, 1]`.
    pub fn buffer_ratio(mut self, ratio: f64) -> Self {
        self.buffer_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the factor applied to the delay when the recent request
    /// frequency exceeds `max_per_second`. Values below 1 are normalised
    /// to 1.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Caps any single computed delay.
    pub fn max_backoff(mut self, cap: Duration) -> Self {
        self.max_backoff = cap.max(Duration::from_millis(1));
        self
    }

    /// Enables or disables adaptive behaviour (band retuning on
    /// observations and recent-frequency backoff).
    pub fn adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    /// Sets the quota assumed before the first observation.
    pub fn initial_remaining(mut self, remaining: u64) -> Self {
        self.initial_remaining = remaining;
        self
    }

    /// Sets how far away the first reset is assumed to be.
    pub fn initial_window(mut self, window: Duration) -> Self {
        self.initial_window = window;
        self
    }

    /// Replaces the adaptive retune table.
    pub fn bands(mut self, bands: PacingBands) -> Self {
        self.bands = bands;
        self
    }

    /// Sets the name for this limiter instance (used in telemetry
    /// labels).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a hook invoked when a permit is granted.
    ///
    /// The hook receives how long the caller waited. It runs inline on
    /// the acquiring task, so keep it cheap.
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.hooks.permit_acquired = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when a quota observation is applied,
    /// with the clamped remaining count.
    pub fn on_quota_observed<F>(mut self, f: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.hooks.quota_observed = Some(Arc::new(f));
        self
    }

    /// Registers a hook invoked when an observation moves pacing to a
    /// different band, with the new ceiling and buffer ratio.
    pub fn on_retuned<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, f64) + Send + Sync + 'static,
    {
        self.hooks.retuned = Some(Arc::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_per_second: self.max_per_second,
            buffer_ratio: self.buffer_ratio,
            backoff_multiplier: self.backoff_multiplier,
            max_backoff: self.max_backoff,
            adaptive: self.adaptive,
            initial_remaining: self.initial_remaining,
            initial_window: self.initial_window,
            bands: self.bands,
            hooks: self.hooks,
            name: self.name,
        }
    }
}
