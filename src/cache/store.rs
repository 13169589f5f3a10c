//! Cache Store Module
//!
//! Main cache engine: entry table, eviction, expiration, statistics and
//! snapshot restore/flush behind one explicit instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::cache::clock::duration_ms;
use crate::cache::eviction::{plan_admission, plan_trim};
use crate::cache::persistence::{PersistencePort, Snapshot, SNAPSHOT_VERSION};
use crate::cache::size::{estimate_size_bytes, estimate_size_mb};
use crate::cache::stats::{to_datetime, StatsCollector};
use crate::cache::{
    CacheEntry, CacheStats, CachedResponse, Clock, LruTracker, RequestDescriptor, SystemClock,
};
use crate::config::{CacheConfig, CacheConfigUpdate};
use crate::error::Result;

// == Cache Store ==
/// Bounded response cache with LRU, largest-first and TTL eviction.
///
/// `get` and `set` never fail from the caller's point of view: a miss, an
/// expired entry and a rejected insert all look like absence.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Request counters and latency window
    stats: StatsCollector,
    /// Sum of `size_bytes` over all entries
    total_size_bytes: u64,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    persistence: Option<Arc<dyn PersistencePort>>,
}

impl CacheStore {
    // == Constructors ==
    /// Creates an empty, memory-only store on the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty, memory-only store on the given clock.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Rejected cache config ({}), using defaults", e);
                CacheConfig::default()
            }
        };

        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: StatsCollector::new(),
            total_size_bytes: 0,
            config,
            clock,
            persistence: None,
        }
    }

    /// Creates a store backed by `persistence` and restores the last snapshot.
    pub fn open(config: CacheConfig, persistence: Box<dyn PersistencePort>) -> Self {
        Self::open_with_clock(config, persistence, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        config: CacheConfig,
        persistence: Box<dyn PersistencePort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut store = Self::with_clock(config, clock);
        store.persistence = Some(Arc::from(persistence));
        store.restore();
        store
    }

    // == Get ==
    /// Returns the live value under `key`.
    ///
    /// Expired entries are removed on the spot. Every call counts as one
    /// request and contributes one latency sample.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let started = Instant::now();
        let now = self.clock.now_ms();

        let value = match self.entries.get(key).map(|e| e.is_expired(now)) {
            None => None,
            Some(true) => {
                self.remove_entry(key);
                debug!("Lazy expiration removed key {}", key);
                None
            }
            Some(false) => self.entries.get_mut(key).map(|entry| {
                entry.record_access(now);
                entry.data.clone()
            }),
        };

        if value.is_some() {
            self.lru.touch(key);
        }

        let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;
        self.stats.record_lookup(value.is_some(), latency_ms);
        value
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Rejections (oversize values, serialization faults) are logged and
    /// leave the store unchanged.
    pub fn set(&mut self, key: String, value: Value, ttl: Option<Duration>) {
        if let Err(e) = self.try_set(key.clone(), value, ttl) {
            warn!("Not caching key {}: {}", key, e);
        }
    }

    /// Like [`set`](Self::set) but reports why a value was not cached.
    pub fn try_set(&mut self, key: String, value: Value, ttl: Option<Duration>) -> Result<()> {
        let size_bytes = estimate_size_bytes(&value, self.config.compression_enabled)?;
        let victims = plan_admission(&self.entries, &self.lru, &self.config, &key, size_bytes)?;

        for victim in victims {
            self.remove_entry(&victim);
            self.stats.record_eviction();
            debug!("Evicted key {} to admit {}", victim, key);
        }

        let ttl = ttl
            .filter(|t| !t.is_zero())
            .unwrap_or_else(|| self.config.default_ttl());
        let entry = CacheEntry::new(value, size_bytes, self.clock.now_ms(), duration_ms(ttl));

        if let Some(old) = self.entries.insert(key.clone(), entry) {
            self.total_size_bytes -= old.size_bytes;
        }
        self.total_size_bytes += size_bytes;
        self.lru.touch(&key);

        debug!("Cached key {} ({} bytes)", key, size_bytes);
        Ok(())
    }

    // == Delete ==
    /// Removes an entry, returning whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Drops every entry, resets the counters and discards the stored
    /// snapshot so a cleared cache cannot come back after a restart.
    pub fn clear(&mut self) {
        self.clear_memory();
        self.discard_snapshot();
    }

    /// Drops every entry and resets the counters, leaving the stored
    /// snapshot for the caller to remove through [`persistence`](Self::persistence).
    pub fn clear_memory(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.total_size_bytes = 0;
        self.stats.reset();
        info!("Cache cleared: removed {} entries", removed);
    }

    // == Update Config ==
    /// Applies a partial configuration change and trims the store to any
    /// lowered budget. Invalid updates change nothing.
    pub fn update_config(&mut self, update: CacheConfigUpdate) -> Result<()> {
        self.config = update.apply_to(&self.config)?;

        let victims = plan_trim(&self.entries, &self.lru, &self.config);
        let evicted = victims.len();
        for victim in victims {
            self.remove_entry(&victim);
            self.stats.record_eviction();
        }

        info!(
            "Cache config updated: max_entries={}, max_total_size_bytes={}, default_ttl={}s (evicted {})",
            self.config.max_entries,
            self.config.max_total_size_bytes,
            self.config.default_ttl_secs,
            evicted
        );
        Ok(())
    }

    // == Stats ==
    /// Returns the current statistics report.
    pub fn stats(&self) -> CacheStats {
        let hit_rate = self.stats.hit_rate();
        let oldest = self.entries.values().map(|e| e.created_at).min();
        let newest = self.entries.values().map(|e| e.created_at).max();

        CacheStats {
            total_entries: self.entries.len(),
            total_size_bytes: self.total_size_bytes,
            total_size_mb: estimate_size_mb(self.total_size_bytes),
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            total_requests: self.stats.total_requests(),
            evictions: self.stats.evictions(),
            hit_rate,
            miss_rate: 100.0 - hit_rate,
            average_lookup_latency_ms: self.stats.average_latency_ms(),
            oldest_entry_at: oldest.and_then(to_datetime),
            newest_entry_at: newest.and_then(to_datetime),
        }
    }

    // == Export Snapshot ==
    /// Debug view of the whole cache, least recently used entry first.
    pub fn export_snapshot(&self) -> Value {
        let now = self.clock.now_ms();
        let entries: Vec<Value> = self
            .lru
            .iter_oldest_first()
            .filter_map(|key| self.entries.get(key).map(|entry| (key, entry)))
            .map(|(key, entry)| {
                json!({
                    "key": key,
                    "sizeBytes": entry.size_bytes,
                    "createdAt": to_datetime(entry.created_at),
                    "expiresAt": to_datetime(entry.expires_at),
                    "expired": entry.is_expired(now),
                    "ttlRemainingMs": entry.ttl_remaining_ms(now),
                    "accessCount": entry.access_count,
                    "lastAccessedAt": to_datetime(entry.last_accessed_at),
                    "data": entry.data,
                })
            })
            .collect();

        json!({
            "exportedAt": to_datetime(now),
            "config": self.config,
            "stats": self.stats(),
            "entries": entries,
        })
    }

    // == Cleanup Expired ==
    /// Removes every expired entry, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }
        expired_keys.len()
    }

    // == Generated Responses ==
    /// Caches a generated payload under the key derived from `descriptor`.
    pub fn cache_ai_response<T: Serialize>(&mut self, descriptor: &RequestDescriptor, payload: &T) {
        if let Err(e) = self.try_cache_ai_response(descriptor, payload) {
            warn!("Not caching response for topic '{}': {}", descriptor.topic, e);
        }
    }

    /// Like [`cache_ai_response`](Self::cache_ai_response), returning the key
    /// on success.
    pub fn try_cache_ai_response<T: Serialize>(
        &mut self,
        descriptor: &RequestDescriptor,
        payload: &T,
    ) -> Result<String> {
        let key = descriptor.cache_key();
        let envelope = CachedResponse::new(descriptor.clone(), self.clock.now_ms(), payload);
        let value = serde_json::to_value(&envelope)?;
        self.try_set(key.clone(), value, None)?;
        Ok(key)
    }

    /// Looks up a previously generated payload for `descriptor`.
    ///
    /// Envelopes from another cache format version, or payloads that do not
    /// decode as `T`, are reported as absent.
    pub fn get_cached_ai_response<T: DeserializeOwned>(
        &mut self,
        descriptor: &RequestDescriptor,
    ) -> Option<T> {
        let key = descriptor.cache_key();
        let value = self.get(&key)?;

        match serde_json::from_value::<CachedResponse<T>>(value) {
            Ok(envelope) if envelope.is_current() => Some(envelope.payload),
            Ok(envelope) => {
                debug!(
                    "Ignoring cached response {} with format version {}",
                    key, envelope.version
                );
                None
            }
            Err(e) => {
                warn!("Cached response {} could not be decoded: {}", key, e);
                None
            }
        }
    }

    // == Persistence ==
    /// Writes a snapshot; failures are logged and otherwise ignored.
    pub fn flush(&self) {
        match self.try_flush() {
            Ok(true) => info!("Cache snapshot written ({} entries)", self.entries.len()),
            Ok(false) => debug!("Persistence disabled, snapshot skipped"),
            Err(e) => warn!("Cache snapshot not written: {}", e),
        }
    }

    /// Writes a snapshot of all live entries and the request counters.
    ///
    /// Returns `Ok(false)` when persistence is disabled or not configured.
    pub fn try_flush(&self) -> Result<bool> {
        let Some(port) = self.persistence.as_ref() else {
            return Ok(false);
        };
        if !self.config.persistence_enabled {
            return Ok(false);
        }

        let now = self.clock.now_ms();
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entries: self
                .lru
                .iter_oldest_first()
                .filter_map(|key| self.entries.get(key).map(|entry| (key, entry)))
                .filter(|(_, entry)| !entry.is_expired(now))
                .map(|(key, entry)| (key.clone(), entry.clone()))
                .collect(),
            stats: self.stats.to_persisted(),
            snapshot_at: now,
        };

        let bytes = snapshot.encode(self.config.compression_enabled)?;
        port.write(&bytes)?;
        Ok(true)
    }

    /// Loads the stored snapshot. Unreadable or stale snapshots are deleted
    /// and the store starts empty.
    fn restore(&mut self) {
        if !self.config.persistence_enabled {
            return;
        }
        let Some(port) = self.persistence.as_ref() else {
            return;
        };

        let snapshot = match port.read().and_then(|bytes| bytes.map(|b| Snapshot::decode(&b)).transpose()) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No cache snapshot found, starting empty");
                return;
            }
            Err(e) => {
                warn!("Discarding unreadable cache snapshot: {}", e);
                self.discard_snapshot();
                return;
            }
        };

        let now = self.clock.now_ms();
        let max_age_ms = duration_ms(self.config.snapshot_max_age());
        if snapshot.age_ms(now) > max_age_ms {
            info!(
                "Discarding stale cache snapshot ({}s old)",
                snapshot.age_ms(now) / 1_000
            );
            self.discard_snapshot();
            return;
        }

        let mut dropped = 0;
        for (key, mut entry) in snapshot.entries {
            if entry.expires_at <= now {
                dropped += 1;
                continue;
            }
            // Stored sizes are not trusted; the budgets depend on them
            entry.size_bytes =
                match estimate_size_bytes(&entry.data, self.config.compression_enabled) {
                    Ok(size) => size,
                    Err(e) => {
                        warn!("Dropping restored key {}: {}", key, e);
                        dropped += 1;
                        continue;
                    }
                };
            self.total_size_bytes += entry.size_bytes;
            if let Some(old) = self.entries.insert(key.clone(), entry) {
                self.total_size_bytes -= old.size_bytes;
            }
            self.lru.touch(&key);
        }
        self.stats = StatsCollector::from_persisted(snapshot.stats);

        for victim in plan_trim(&self.entries, &self.lru, &self.config) {
            self.remove_entry(&victim);
            dropped += 1;
        }

        info!(
            "Cache snapshot restored: {} entries ({} dropped)",
            self.entries.len(),
            dropped
        );
    }

    fn discard_snapshot(&self) {
        if let Some(port) = self.persistence.as_ref() {
            if let Err(e) = port.remove() {
                warn!("Could not delete cache snapshot: {}", e);
            }
        }
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    /// The snapshot port, if this store was opened with one.
    pub fn persistence(&self) -> Option<Arc<dyn PersistencePort>> {
        self.persistence.clone()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Inspects an entry without counting a request or touching its recency.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.total_size_bytes -= entry.size_bytes;
        Some(entry)
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
