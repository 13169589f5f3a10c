//! Eviction Module
//!
//! Decides which entries must go so that an insert (or a budget change) keeps
//! the store within its entry-count and byte budgets.
//!
//! Count pressure is relieved least-recently-used first. Byte pressure is
//! relieved largest-first, ties broken by recency, because the violated
//! constraint is bytes rather than staleness.

use std::collections::HashMap;

use crate::cache::{CacheEntry, LruTracker};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Admission ==
/// Plans the evictions needed to admit a new value of `new_size` bytes under
/// `key`.
///
/// An existing entry under `key` is about to be replaced, so it neither
/// counts against the budgets nor gets chosen as a victim. Nothing is
/// mutated; on `Err` the caller must leave the store untouched.
pub fn plan_admission(
    entries: &HashMap<String, CacheEntry>,
    lru: &LruTracker,
    config: &CacheConfig,
    key: &str,
    new_size: u64,
) -> Result<Vec<String>> {
    let item_limit = config.max_item_size_bytes();
    if new_size > item_limit {
        return Err(CacheError::OversizeValue {
            size_bytes: new_size,
            limit_bytes: item_limit,
        });
    }

    // Budget could never hold this entry, even with everything else gone
    if new_size > config.max_total_size_bytes {
        return Err(CacheError::OversizeValue {
            size_bytes: new_size,
            limit_bytes: config.max_total_size_bytes,
        });
    }

    let keep_at_most = config.max_entries.saturating_sub(1);
    let byte_budget = config.max_total_size_bytes - new_size;

    let candidates = lru
        .iter_oldest_first()
        .filter(|k| k.as_str() != key && entries.contains_key(k.as_str()))
        .collect();

    Ok(select_victims(entries, candidates, keep_at_most, byte_budget))
}

// == Trim ==
/// Plans the evictions that bring an existing store back within budget,
/// e.g. after the limits were lowered or a snapshot was restored.
///
/// Entries above the per-item limit go first, least recently used first,
/// then the count and byte budgets are enforced as on admission.
pub fn plan_trim(
    entries: &HashMap<String, CacheEntry>,
    lru: &LruTracker,
    config: &CacheConfig,
) -> Vec<String> {
    let item_limit = config.max_item_size_bytes();
    let (oversized, candidates): (Vec<&String>, Vec<&String>) = lru
        .iter_oldest_first()
        .filter(|k| entries.contains_key(k.as_str()))
        .partition(|k| entries[k.as_str()].size_bytes > item_limit);

    let mut victims: Vec<String> = oversized.into_iter().cloned().collect();
    victims.extend(select_victims(
        entries,
        candidates,
        config.max_entries,
        config.max_total_size_bytes,
    ));
    victims
}

/// Picks victims from `candidates` (oldest first) until at most
/// `keep_at_most` of them totalling at most `byte_budget` bytes remain.
fn select_victims(
    entries: &HashMap<String, CacheEntry>,
    mut remaining: Vec<&String>,
    keep_at_most: usize,
    byte_budget: u64,
) -> Vec<String> {
    let mut total: u64 = remaining
        .iter()
        .map(|k| entries[k.as_str()].size_bytes)
        .fold(0, u64::saturating_add);
    let mut victims = Vec::new();

    // Count: drop least recently used
    while remaining.len() > keep_at_most {
        let key = remaining.remove(0);
        total = total.saturating_sub(entries[key.as_str()].size_bytes);
        victims.push(key.clone());
    }

    if total <= byte_budget {
        return victims;
    }

    // Bytes: drop largest first; stable sort keeps LRU order among equals
    remaining.sort_by(|a, b| entries[b.as_str()].size_bytes.cmp(&entries[a.as_str()].size_bytes));
    for key in remaining {
        if total <= byte_budget {
            break;
        }
        total = total.saturating_sub(entries[key.as_str()].size_bytes);
        victims.push(key.clone());
    }

    victims
}
