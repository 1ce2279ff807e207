//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check both policies against a reference LRU model.

use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::cache::{ApproxLru, ConcurrentCache, ExactLru, ManualClock, ShardRouter};

// == Strategies ==
/// Small key space so sequences revisit keys and exercise updates.
fn key_strategy() -> impl Strategy<Value = u16> {
    0u16..48
}

fn dimensions_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..24).prop_flat_map(|capacity| (Just(capacity), 1usize..=capacity.min(8)))
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u16, value: u32 },
    Get { key: u16 },
    Contains { key: u16 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Contains { key }),
    ]
}

// == Reference Model ==
/// Single-threaded exact LRU; front = most recently used.
struct LruModel {
    order: VecDeque<(u16, u32)>,
    capacity: usize,
}

impl LruModel {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            capacity,
        }
    }

    fn position(&self, key: u16) -> Option<usize> {
        self.order.iter().position(|(k, _)| *k == key)
    }

    fn put(&mut self, key: u16, value: u32) {
        if let Some(pos) = self.position(key) {
            self.order.remove(pos);
        } else if self.order.len() >= self.capacity {
            self.order.pop_back();
        }
        self.order.push_front((key, value));
    }

    fn get(&mut self, key: u16) -> Option<u32> {
        let pos = self.position(key)?;
        let entry = self.order.remove(pos)?;
        self.order.push_front(entry);
        Some(entry.1)
    }

    fn contains(&self, key: u16) -> bool {
        self.position(key).is_some()
    }
}

/// Replays `ops` against `cache` and the model, comparing every result.
/// `tick` runs before each operation.
fn check_against_model<C, F>(cache: &C, capacity: usize, ops: &[CacheOp], tick: F) -> Result<(), TestCaseError>
where
    C: ConcurrentCache<u16, u32>,
    F: Fn(),
{
    let mut model = LruModel::new(capacity);

    for op in ops {
        tick();
        match *op {
            CacheOp::Put { key, value } => {
                cache.put(key, value);
                model.put(key, value);
            }
            CacheOp::Get { key } => {
                prop_assert_eq!(cache.get(&key), model.get(key), "get({}) diverged", key);
            }
            CacheOp::Contains { key } => {
                prop_assert_eq!(cache.contains(&key), model.contains(key), "contains({}) diverged", key);
            }
        }
        prop_assert_eq!(cache.size(), model.order.len());
        prop_assert!(cache.size() <= capacity);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any operation sequence and any valid dimensions, the exact policy
    // matches a reference LRU step for step.
    #[test]
    fn prop_exact_matches_lru_model(
        (capacity, shards) in dimensions_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let cache = ExactLru::new(capacity, shards).unwrap();
        check_against_model(&cache, capacity, &ops, || {})?;
    }

    // With a clock that advances on every operation, timestamps are unique
    // and the approximate policy degenerates to exact LRU.
    #[test]
    fn prop_approx_with_distinct_stamps_matches_lru_model(
        (capacity, shards) in dimensions_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ApproxLru::with_clock(capacity, shards, clock.clone()).unwrap();
        check_against_model(&cache, capacity, &ops, || {
            clock.advance(1);
        })?;
    }

    // Size never exceeds capacity for any sequence of distinct-key puts.
    #[test]
    fn prop_capacity_enforcement(
        (capacity, shards) in dimensions_strategy(),
        keys in prop::collection::hash_set(any::<u32>(), 1..200)
    ) {
        let exact = ExactLru::new(capacity, shards).unwrap();
        let approx = ApproxLru::new(capacity, shards).unwrap();

        for key in keys {
            exact.put(key, key);
            approx.put(key, key);
            prop_assert!(exact.size() <= capacity, "exact size {} > {}", exact.size(), capacity);
            prop_assert!(approx.size() <= capacity, "approx size {} > {}", approx.size(), capacity);
        }
    }

    // Miss before put, hit with the same value right after.
    #[test]
    fn prop_miss_then_hit(key in any::<u64>(), value in any::<u64>()) {
        let exact = ExactLru::new(8, 2).unwrap();
        let approx = ApproxLru::new(8, 2).unwrap();

        prop_assert_eq!(exact.get(&key), None);
        prop_assert_eq!(approx.get(&key), None);

        exact.put(key, value);
        approx.put(key, value);

        prop_assert_eq!(exact.get(&key), Some(value));
        prop_assert_eq!(approx.get(&key), Some(value));
    }

    // Second put replaces the value and leaves size unchanged.
    #[test]
    fn prop_update_in_place(key in any::<u64>(), v1 in any::<u64>(), v2 in any::<u64>()) {
        let exact = ExactLru::new(8, 2).unwrap();
        let approx = ApproxLru::new(8, 2).unwrap();

        exact.put(key, v1);
        approx.put(key, v1);
        let (exact_size, approx_size) = (exact.size(), approx.size());

        exact.put(key, v2);
        approx.put(key, v2);

        prop_assert_eq!(exact.get(&key), Some(v2));
        prop_assert_eq!(approx.get(&key), Some(v2));
        prop_assert_eq!(exact.size(), exact_size);
        prop_assert_eq!(approx.size(), approx_size);
    }

    // After clear nothing previously inserted is present.
    #[test]
    fn prop_clear_is_total(
        (capacity, shards) in dimensions_strategy(),
        keys in prop::collection::vec(any::<u32>(), 0..64)
    ) {
        let exact = ExactLru::new(capacity, shards).unwrap();
        let approx = ApproxLru::new(capacity, shards).unwrap();
        for key in &keys {
            exact.put(*key, *key);
            approx.put(*key, *key);
        }

        exact.clear();
        approx.clear();

        prop_assert_eq!(exact.size(), 0);
        prop_assert_eq!(approx.size(), 0);
        for key in keys.iter().collect::<HashSet<_>>() {
            prop_assert!(!exact.contains(key));
            prop_assert!(!approx.contains(key));
        }
    }

    // The router sends a key to the same in-range shard every time.
    #[test]
    fn prop_router_stability(shards in 1usize..64, keys in prop::collection::vec(any::<String>(), 1..50)) {
        let router = ShardRouter::new(shards).unwrap();
        for key in &keys {
            let first = router.index_for(key);
            prop_assert!(first < shards);
            prop_assert_eq!(router.index_for(key), first);
            prop_assert_eq!(router.index_for(&key.clone()), first);
        }
    }
}
