//! Property tests for the adaptive rate limiter.
//!
//! Invariants tested:
//! - A window never grants more acquires than its observed quota
//! - Completion estimates are monotone in the request count
//! - Configuration inputs are always normalised into valid ranges

use proptest::prelude::*;
use quotaflow_ratelimiter::{AdaptiveRateLimiter, RateLimiterConfig};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Property: successful acquires inside one window never exceed the
    /// remaining quota observed at its start.
    #[test]
    fn window_quota_is_never_overrun(
        remaining in 1u64..=4,
        window_ms in 300u64..=600,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let limiter = AdaptiveRateLimiter::new(
                RateLimiterConfig::builder()
                    .initial_remaining(remaining)
                    .initial_window(Duration::from_millis(window_ms))
                    .buffer_ratio(0.0)
                    .max_per_second(1000)
                    .build(),
            );
            let cancel = CancellationToken::new();
            let deadline = Instant::now() + Duration::from_millis(window_ms);

            let mut granted = 0u64;
            loop {
                limiter.acquire(&cancel).await.unwrap();
                if Instant::now() < deadline {
                    granted += 1;
                } else {
                    break;
                }
            }

            prop_assert!(
                granted <= remaining,
                "granted {} acquires against a quota of {}",
                granted,
                remaining
            );
            Ok(())
        })?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: estimate_completion(n + 1) >= estimate_completion(n).
    #[test]
    fn completion_estimates_are_monotone(
        remaining in 0u64..=10_000,
        window_secs in 1u64..=7200,
        buffer in 0.0f64..=0.5,
        n in 0u64..=2000,
    ) {
        let limiter = AdaptiveRateLimiter::new(
            RateLimiterConfig::builder()
                .initial_remaining(remaining)
                .initial_window(Duration::from_secs(window_secs))
                .buffer_ratio(buffer)
                .build(),
        );

        let smaller = limiter.estimate_completion(n);
        let larger = limiter.estimate_completion(n + 1);
        prop_assert!(
            larger >= smaller,
            "estimate({}) = {:?} but estimate({}) = {:?}",
            n + 1,
            larger,
            n,
            smaller
        );
    }

    /// Property: configure never leaves the limiter in an invalid state.
    #[test]
    fn configuration_is_always_normalised(
        rate in 0u32..=10_000,
        ratio in -2.0f64..=3.0,
        adaptive in proptest::bool::ANY,
    ) {
        let limiter = AdaptiveRateLimiter::new(RateLimiterConfig::builder().build());
        limiter.configure(rate, ratio, adaptive);

        let snapshot = limiter.snapshot();
        prop_assert!(snapshot.max_per_second >= 1);
        prop_assert!((0.0..=1.0).contains(&snapshot.buffer_ratio));
        prop_assert_eq!(snapshot.adaptive, adaptive);
    }
}
