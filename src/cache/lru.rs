//! LRU Tracker Module
//!
//! Orders keys by their last access for least-recently-used eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order with a monotonically increasing sequence number.
///
/// Every touch stamps the key with the next sequence, so the smallest
/// sequence is the least recently used key. Keys that were never touched
/// after insertion keep their insertion order.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Sequence -> key, oldest first
    order: BTreeMap<u64, String>,
    /// Key -> current sequence
    positions: HashMap<String, u64>,
    next_seq: u64,
}

impl LruTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unknown.
    pub fn touch(&mut self, key: &str) {
        if let Some(old) = self.positions.remove(key) {
            self.order.remove(&old);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        self.positions.insert(key.to_string(), seq);
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        if let Some(seq) = self.positions.remove(key) {
            self.order.remove(&seq);
        }
    }

    /// Keys from least to most recently used.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &String> {
        self.order.values()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }
}
