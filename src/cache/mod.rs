//! Cache Module
//!
//! Bounded response cache with TTL expiration, LRU and largest-first
//! eviction, statistics and snapshot persistence.

mod clock;
mod entry;
mod eviction;
mod key;
mod lru;
mod persistence;
mod response;
mod size;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use eviction::{plan_admission, plan_trim};
pub use key::{generate_key, AmountTier, NormalizedDescriptor, RequestDescriptor, DEFAULT_MODEL};
pub use lru::LruTracker;
pub use persistence::{FilePersistence, MemoryPersistence, PersistencePort, Snapshot, SNAPSHOT_VERSION};
pub use response::{CachedResponse, CACHE_FORMAT_VERSION};
pub use size::{compact_value, estimate_size_bytes, estimate_size_mb};
pub use stats::{CacheStats, PersistedStats, StatsCollector, LATENCY_WINDOW};
pub use store::CacheStore;

/// The one cache instance, shared between the HTTP surface and the sweep task.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing across tasks.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
