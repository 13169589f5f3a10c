//! Cache Statistics Module
//!
//! Tracks hits, misses, evictions and a rolling window of lookup latencies,
//! and renders the report consumed by the performance governor.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of lookup latencies kept for the rolling average.
pub const LATENCY_WINDOW: usize = 100;

// == Stats Collector ==
/// Request counters and the latency ring buffer.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    hits: u64,
    misses: u64,
    total_requests: u64,
    evictions: u64,
    /// Most recent lookup durations in milliseconds, oldest first
    latency_samples: VecDeque<f64>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Lookup ==
    /// Counts one `get` and keeps its latency.
    pub fn record_lookup(&mut self, hit: bool, latency_ms: f64) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.total_requests += 1;

        if self.latency_samples.len() == LATENCY_WINDOW {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_ms);
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Rates ==
    /// Percentage of requests that hit, 0 when nothing was requested.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            100.0 * self.hits as f64 / self.total_requests as f64
        }
    }

    pub fn average_latency_ms(&self) -> f64 {
        if self.latency_samples.is_empty() {
            0.0
        } else {
            self.latency_samples.iter().sum::<f64>() / self.latency_samples.len() as f64
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn sample_count(&self) -> usize {
        self.latency_samples.len()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // == Persistence ==
    pub fn to_persisted(&self) -> PersistedStats {
        PersistedStats {
            hits: self.hits,
            misses: self.misses,
            total_requests: self.total_requests,
            latency_samples: self.latency_samples.iter().copied().collect(),
        }
    }

    /// Rebuilds the collector from a snapshot, keeping only the newest
    /// `LATENCY_WINDOW` samples.
    pub fn from_persisted(persisted: PersistedStats) -> Self {
        let skip = persisted
            .latency_samples
            .len()
            .saturating_sub(LATENCY_WINDOW);
        Self {
            hits: persisted.hits,
            misses: persisted.misses,
            total_requests: persisted.total_requests,
            evictions: 0,
            latency_samples: persisted.latency_samples.into_iter().skip(skip).collect(),
        }
    }
}

/// Counters as written to a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    #[serde(default)]
    pub latency_samples: Vec<f64>,
}

// == Cache Stats ==
/// Point-in-time report, derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub evictions: u64,
    /// Percentage, 0-100
    pub hit_rate: f64,
    /// `100 - hit_rate`
    pub miss_rate: f64,
    pub average_lookup_latency_ms: f64,
    pub oldest_entry_at: Option<DateTime<Utc>>,
    pub newest_entry_at: Option<DateTime<Utc>>,
}

/// Converts Unix milliseconds to a UTC timestamp for reports.
pub fn to_datetime(ms: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms as i64)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StatsCollector::new();
        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.misses(), 0);
        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.average_latency_ms(), 0.0);
    }

    #[test]
    fn test_hit_rate_is_a_percentage() {
        let mut stats = StatsCollector::new();
        stats.record_lookup(true, 1.0);
        stats.record_lookup(true, 1.0);
        stats.record_lookup(true, 1.0);
        stats.record_lookup(false, 1.0);

        assert_eq!(stats.total_requests(), 4);
        assert!((stats.hit_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_latency_window_drops_oldest() {
        let mut stats = StatsCollector::new();
        stats.record_lookup(false, 1_000.0);
        for _ in 0..LATENCY_WINDOW {
            stats.record_lookup(true, 2.0);
        }

        assert_eq!(stats.sample_count(), LATENCY_WINDOW);
        assert!((stats.average_latency_ms() - 2.0).abs() < 1e-9);
        assert_eq!(stats.total_requests(), LATENCY_WINDOW as u64 + 1);
    }

    #[test]
    fn test_record_eviction() {
        let mut stats = StatsCollector::new();
        stats.record_eviction();
        stats.record_eviction();
        assert_eq!(stats.evictions(), 2);
    }

    #[test]
    fn test_reset() {
        let mut stats = StatsCollector::new();
        stats.record_lookup(true, 3.0);
        stats.record_eviction();
        stats.reset();

        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.evictions(), 0);
        assert_eq!(stats.sample_count(), 0);
    }

    #[test]
    fn test_persisted_counters_survive() {
        let mut stats = StatsCollector::new();
        stats.record_lookup(true, 4.0);
        stats.record_lookup(false, 2.0);

        let restored = StatsCollector::from_persisted(stats.to_persisted());
        assert_eq!(restored.hits(), 1);
        assert_eq!(restored.misses(), 1);
        assert_eq!(restored.total_requests(), 2);
        assert!((restored.average_latency_ms() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_persisted_samples_are_capped() {
        let persisted = PersistedStats {
            hits: 0,
            misses: 0,
            total_requests: 0,
            latency_samples: (0..150).map(|i| i as f64).collect(),
        };

        let restored = StatsCollector::from_persisted(persisted);
        assert_eq!(restored.sample_count(), LATENCY_WINDOW);
        // samples 50..150 remain
        assert!((restored.average_latency_ms() - 99.5).abs() < 1e-9);
    }
}
