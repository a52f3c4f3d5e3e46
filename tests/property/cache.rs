//! Property tests for the result cache.
//!
//! Invariants tested:
//! - Size never exceeds capacity
//! - A set is observable until displaced or expired
//! - Hit-rate accounting is consistent with the op sequence

use proptest::prelude::*;
use quotaflow_cache::{CacheConfig, ResultCache};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Get(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Set(k % 16, v)),
        any::<u8>().prop_map(|k| Op::Get(k % 16)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: the cache never stores more than its capacity, and a
    /// freshly set key reads back its value while the TTL is long.
    #[test]
    fn capacity_and_read_back_hold(
        capacity in 1usize..=8,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let cache: ResultCache<u8, u32> = ResultCache::new(
            CacheConfig::builder()
                .max_size(capacity)
                .ttl(Duration::from_secs(600))
                .build(),
        );

        for op in ops {
            match op {
                Op::Set(key, value) => {
                    cache.set(key, value);
                    // Long TTL and no interleaved ops: the entry is
                    // immediately observable.
                    prop_assert_eq!(cache.get(&key), Some(value));
                }
                Op::Get(key) => {
                    let _ = cache.get(&key);
                }
            }
            prop_assert!(cache.len() <= capacity);
        }
    }

    /// Property: hits + misses equals the number of lookups, and the
    /// hit rate stays in [0, 1].
    #[test]
    fn hit_accounting_is_consistent(
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let cache: ResultCache<u8, u32> = ResultCache::new(
            CacheConfig::builder()
                .max_size(8)
                .ttl(Duration::from_secs(600))
                .build(),
        );

        let mut lookups = 0u64;
        for op in ops {
            match op {
                Op::Set(key, value) => cache.set(key, value),
                Op::Get(key) => {
                    let _ = cache.get(&key);
                    lookups += 1;
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits + stats.misses, lookups);
        prop_assert!((0.0..=1.0).contains(&stats.hit_rate));
    }
}
