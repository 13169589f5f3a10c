//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the engine's behavioral guarantees over random
//! operation sequences.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::cache::{AmountTier, CacheStore, ManualClock, MemoryPersistence, RequestDescriptor};
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;

fn test_config(max_entries: usize, max_total_size_bytes: u64) -> CacheConfig {
    CacheConfig {
        max_entries,
        max_total_size_bytes,
        ..CacheConfig::default()
    }
}

// == Strategies ==
/// Generates cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,64}"
}

/// Generates small JSON payloads
fn valid_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,256}".prop_map(Value::String),
        any::<i64>().prop_map(|n| json!(n)),
        ("[a-z ]{1,64}", "[a-z]{1,16}").prop_map(|(body, id)| json!({"id": id, "body": body})),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Value },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hits and misses match what callers observed, and every lookup is one request
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = CacheStore::new(test_config(TEST_MAX_ENTRIES, 10 * 1024 * 1024));
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value, None),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.total_requests, expected_hits + expected_misses);
        prop_assert_eq!(stats.total_entries, store.len());

        if stats.total_requests > 0 {
            let expected_rate = 100.0 * expected_hits as f64 / stats.total_requests as f64;
            prop_assert!((stats.hit_rate - expected_rate).abs() < 1e-9);
        }
        prop_assert!((stats.hit_rate + stats.miss_rate - 100.0).abs() < 1e-9);
    }

    // set(k, v, ttl) then get(k) returns v
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl_secs in 1u64..100_000
    ) {
        let mut store = CacheStore::new(test_config(TEST_MAX_ENTRIES, 10 * 1024 * 1024));

        store.set(key.clone(), value.clone(), Some(Duration::from_secs(ttl_secs)));
        prop_assert_eq!(store.get(&key), Some(value));
    }

    // Overwriting keeps a single entry holding the newest value
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let mut store = CacheStore::new(test_config(TEST_MAX_ENTRIES, 10 * 1024 * 1024));

        store.set(key.clone(), value1, None);
        store.set(key.clone(), value2.clone(), None);

        prop_assert_eq!(store.get(&key), Some(value2));
        prop_assert_eq!(store.len(), 1);
    }

    // Neither budget is ever exceeded after a set, and the byte tally stays exact
    #[test]
    fn prop_budget_enforcement(
        entries in prop::collection::vec((valid_key_strategy(), valid_value_strategy()), 1..200),
        max_entries in 1usize..50,
        max_total_size_bytes in 100u64..5_000
    ) {
        let mut store = CacheStore::new(test_config(max_entries, max_total_size_bytes));

        for (key, value) in entries {
            store.set(key, value, None);
            prop_assert!(store.len() <= max_entries);
            prop_assert!(store.total_size_bytes() <= max_total_size_bytes);
        }

        let export = store.export_snapshot();
        let summed: u64 = export["entries"]
            .as_array()
            .map(|list| list.iter().filter_map(|e| e["sizeBytes"].as_u64()).sum())
            .unwrap_or(0);
        prop_assert_eq!(summed, store.total_size_bytes());
    }

    // Values above the per-item limit are never present after set
    #[test]
    fn prop_oversize_never_stored(extra in 1usize..500, max_total in 100u64..2_000) {
        let mut store = CacheStore::new(test_config(TEST_MAX_ENTRIES, max_total));
        let limit = store.config().max_item_size_bytes() as usize;
        // +2 for the JSON quotes
        let value = json!("x".repeat(limit + extra));

        store.set("big".to_string(), value, None);
        prop_assert!(store.peek("big").is_none());
        prop_assert!(store.is_empty());
    }

    // Topic case and surrounding whitespace never change the key
    #[test]
    fn prop_key_ignores_topic_case_and_padding(
        topic in "[a-zA-Z][a-zA-Z ]{0,30}[a-zA-Z]",
        left in " {0,3}",
        right in "[ \t]{0,3}"
    ) {
        let plain = RequestDescriptor::new(
            topic.to_lowercase(),
            "ม.1",
            AmountTier::Standard,
            AmountTier::Light,
        );
        let padded = RequestDescriptor::new(
            format!("{}{}{}", left, topic.to_uppercase(), right),
            "ม.1",
            AmountTier::Standard,
            AmountTier::Light,
        );
        prop_assert_eq!(plain.cache_key(), padded.cache_key());
    }
}

// Property tests for LRU eviction behavior
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Filling to capacity and adding one more evicts exactly the first-inserted key
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(valid_key_strategy(), 3..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys = unique(initial_keys);
        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut store = CacheStore::new(test_config(capacity, 10 * 1024 * 1024));

        for key in &unique_keys {
            store.set(key.clone(), json!(format!("value_{}", key)), None);
        }
        prop_assert_eq!(store.len(), capacity);

        store.set(new_key.clone(), new_value, None);

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(store.peek(&unique_keys[0]).is_none());
        prop_assert!(store.peek(&new_key).is_some());
        for key in unique_keys.iter().skip(1) {
            prop_assert!(store.peek(key).is_some(), "Key '{}' should survive", key);
        }
    }

    // A get on the oldest key protects it; the next oldest goes instead
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys = unique(keys);
        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut store = CacheStore::new(test_config(capacity, 10 * 1024 * 1024));

        for key in &unique_keys {
            store.set(key.clone(), json!(format!("value_{}", key)), None);
        }

        let accessed_key = unique_keys[0].clone();
        prop_assert!(store.get(&accessed_key).is_some());

        store.set(new_key.clone(), new_value, None);

        prop_assert!(store.peek(&accessed_key).is_some());
        prop_assert!(store.peek(&unique_keys[1]).is_none());
        prop_assert!(store.peek(&new_key).is_some());
    }
}

// Time-dependent properties on a manual clock
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Past its TTL an entry is absent, and the lookup removes it
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl_secs in 1u64..86_400
    ) {
        let clock = ManualClock::new(1_700_000_000_000);
        let mut store = CacheStore::with_clock(CacheConfig::default(), Arc::new(clock.clone()));

        store.set(key.clone(), value.clone(), Some(Duration::from_secs(ttl_secs)));
        prop_assert_eq!(store.get(&key), Some(value));

        clock.advance(Duration::from_secs(ttl_secs) + Duration::from_millis(1));
        prop_assert_eq!(store.get(&key), None);
        prop_assert_eq!(store.stats().total_entries, 0);
    }

    // Snapshots older than the staleness window restore nothing at all
    #[test]
    fn prop_stale_snapshot_fully_discarded(
        keys in prop::collection::vec(valid_key_strategy(), 1..10),
        extra_secs in 1u64..100_000
    ) {
        let clock = ManualClock::new(1_700_000_000_000);
        let port = MemoryPersistence::new();
        let config = CacheConfig {
            default_ttl_secs: 7 * 24 * 3_600,
            ..CacheConfig::default()
        };

        let mut store = CacheStore::open_with_clock(
            config.clone(),
            Box::new(port.clone()),
            Arc::new(clock.clone()),
        );
        for key in &keys {
            store.set(key.clone(), json!(key), None);
        }
        store.flush();
        prop_assert!(port.contents().is_some());

        clock.advance(Duration::from_secs(24 * 3_600 + extra_secs));
        let restored = CacheStore::open_with_clock(config, Box::new(port.clone()), Arc::new(clock));

        prop_assert!(restored.is_empty());
        prop_assert_eq!(restored.stats().total_requests, 0);
        prop_assert!(port.contents().is_none(), "stale record should be deleted");
    }
}
