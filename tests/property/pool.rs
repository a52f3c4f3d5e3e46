//! Property tests for the connection pool.
//!
//! Invariants tested:
//! - Stored handles never exceed capacity; in-use count never exceeds size
//! - created + recycled equals the number of successful acquisitions
//! - Single-key round trips create exactly once

use proptest::prelude::*;
use quotaflow_pool::{ConnectionPool, PoolConfig};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: under random keyed acquisitions with immediate
    /// release, counters and sizes stay consistent.
    #[test]
    fn counters_and_capacity_stay_consistent(
        max_size in 1usize..=8,
        keys in prop::collection::vec(0u8..12, 1..200),
    ) {
        let pool: ConnectionPool<u8> =
            ConnectionPool::new(PoolConfig::builder().max_size(max_size).build());

        let mut granted = 0u64;
        for key in keys {
            if let Some(handle) = pool.get(&format!("key-{key}"), move || key) {
                prop_assert_eq!(*handle, key);
                granted += 1;
                drop(handle);
            }

            let stats = pool.stats();
            prop_assert!(stats.size <= max_size);
            prop_assert!(stats.in_use <= stats.size);
        }

        let stats = pool.stats();
        prop_assert_eq!(stats.created + stats.recycled, granted);
        prop_assert!(stats.created as usize <= max_size);
    }

    /// Property: round-tripping one key any number of times builds the
    /// resource exactly once.
    #[test]
    fn single_key_round_trips_create_once(rounds in 1usize..=500) {
        let pool: ConnectionPool<&'static str> =
            ConnectionPool::new(PoolConfig::builder().max_size(4).build());

        for _ in 0..rounds {
            let handle = pool.get("gateway", || "session").unwrap();
            drop(handle);
        }

        let stats = pool.stats();
        prop_assert_eq!(stats.created, 1);
        prop_assert_eq!(stats.recycled, rounds as u64 - 1);
    }
}
