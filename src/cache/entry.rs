//! Cache Entry Module
//!
//! Defines a single cached payload together with its lifecycle and access
//! metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// One cached value. All timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The cached payload, opaque to the cache
    pub data: Value,
    pub created_at: u64,
    pub expires_at: u64,
    /// Estimated serialized size, computed once at insert
    pub size_bytes: u64,
    pub access_count: u64,
    pub last_accessed_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry living `ttl_ms` from `now`.
    ///
    /// A zero TTL is bumped to one millisecond so `expires_at > created_at`
    /// always holds.
    pub fn new(data: Value, size_bytes: u64, now: u64, ttl_ms: u64) -> Self {
        Self {
            data,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms.max(1)),
            size_bytes,
            access_count: 0,
            last_accessed_at: now,
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now` is strictly past `expires_at`.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    // == Record Access ==
    pub fn record_access(&mut self, now: u64) {
        self.access_count += 1;
        self.last_accessed_at = now;
    }

    /// Remaining lifetime in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}
