//! Configuration Module
//!
//! Handles the process configuration (loaded from environment variables) and
//! the cache tunables that can be changed at runtime.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Defaults ==
const DEFAULT_MAX_ENTRIES: usize = 100;
const DEFAULT_MAX_TOTAL_SIZE_BYTES: u64 = 50 * 1024 * 1024;
const DEFAULT_TTL_SECS: u64 = 60 * 60;
const DEFAULT_OVERSIZE_RATIO: f64 = 0.10;
const DEFAULT_SNAPSHOT_MAX_AGE_SECS: u64 = 24 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_SNAPSHOT_PATH: &str = "lesson_cache_snapshot.json";

// == Cache Config ==
/// Cache tunables, mutable at runtime through `CacheStore::update_config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub max_entries: usize,
    /// Byte budget across all entries
    pub max_total_size_bytes: u64,
    /// TTL in seconds for entries stored without an explicit TTL
    pub default_ttl_secs: u64,
    /// Whitespace compaction for size estimates and snapshots
    pub compression_enabled: bool,
    /// Restore on open, snapshot on flush
    pub persistence_enabled: bool,
    /// Largest admissible single value as a fraction of the byte budget
    pub oversize_ratio: f64,
    /// Snapshots older than this are discarded on restore
    pub snapshot_max_age_secs: u64,
}

impl CacheConfig {
    // == Accessors ==
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn snapshot_max_age(&self) -> Duration {
        Duration::from_secs(self.snapshot_max_age_secs)
    }

    /// Size above which a single value is refused outright.
    pub fn max_item_size_bytes(&self) -> u64 {
        (self.max_total_size_bytes as f64 * self.oversize_ratio) as u64
    }

    // == Validate ==
    /// Checks the budget invariants: at least one entry, a non-zero byte
    /// budget, and positive lifetimes.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries < 1 {
            return Err(CacheError::InvalidConfig(
                "maxEntries must be at least 1".to_string(),
            ));
        }
        if self.max_total_size_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "maxTotalSizeBytes must be greater than 0".to_string(),
            ));
        }
        if self.default_ttl_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "defaultTtlSecs must be greater than 0".to_string(),
            ));
        }
        if !self.oversize_ratio.is_finite() || self.oversize_ratio <= 0.0 {
            return Err(CacheError::InvalidConfig(
                "oversizeRatio must be a positive number".to_string(),
            ));
        }
        if self.snapshot_max_age_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "snapshotMaxAgeSecs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads cache tunables from environment variables, falling back to
    /// defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        Self {
            max_entries: env_or("MAX_ENTRIES", DEFAULT_MAX_ENTRIES),
            max_total_size_bytes: env_or("MAX_TOTAL_SIZE_BYTES", DEFAULT_MAX_TOTAL_SIZE_BYTES),
            default_ttl_secs: env_or("DEFAULT_TTL", DEFAULT_TTL_SECS),
            compression_enabled: env_or("COMPRESSION_ENABLED", true),
            persistence_enabled: env_or("PERSISTENCE_ENABLED", true),
            oversize_ratio: env_or("OVERSIZE_RATIO", DEFAULT_OVERSIZE_RATIO),
            snapshot_max_age_secs: env_or("SNAPSHOT_MAX_AGE", DEFAULT_SNAPSHOT_MAX_AGE_SECS),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_total_size_bytes: DEFAULT_MAX_TOTAL_SIZE_BYTES,
            default_ttl_secs: DEFAULT_TTL_SECS,
            compression_enabled: true,
            persistence_enabled: true,
            oversize_ratio: DEFAULT_OVERSIZE_RATIO,
            snapshot_max_age_secs: DEFAULT_SNAPSHOT_MAX_AGE_SECS,
        }
    }
}

// == Partial Update ==
/// A partial `CacheConfig`; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfigUpdate {
    pub max_entries: Option<usize>,
    pub max_total_size_bytes: Option<u64>,
    pub default_ttl_secs: Option<u64>,
    pub compression_enabled: Option<bool>,
    pub persistence_enabled: Option<bool>,
    pub oversize_ratio: Option<f64>,
    pub snapshot_max_age_secs: Option<u64>,
}

impl CacheConfigUpdate {
    /// Merges this update over `current` and validates the result.
    ///
    /// The update is all-or-nothing: an invalid field rejects the whole merge.
    pub fn apply_to(&self, current: &CacheConfig) -> Result<CacheConfig> {
        let merged = CacheConfig {
            max_entries: self.max_entries.unwrap_or(current.max_entries),
            max_total_size_bytes: self
                .max_total_size_bytes
                .unwrap_or(current.max_total_size_bytes),
            default_ttl_secs: self.default_ttl_secs.unwrap_or(current.default_ttl_secs),
            compression_enabled: self
                .compression_enabled
                .unwrap_or(current.compression_enabled),
            persistence_enabled: self
                .persistence_enabled
                .unwrap_or(current.persistence_enabled),
            oversize_ratio: self.oversize_ratio.unwrap_or(current.oversize_ratio),
            snapshot_max_age_secs: self
                .snapshot_max_age_secs
                .unwrap_or(current.snapshot_max_age_secs),
        };
        merged.validate()?;
        Ok(merged)
    }
}

// == Server Config ==
/// Process configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Expiration sweep interval in seconds
    pub sweep_interval: u64,
    /// File holding the persisted snapshot
    pub snapshot_path: PathBuf,
    /// Engine tunables
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiration sweep frequency in seconds (default: 300)
    /// - `SNAPSHOT_PATH` - Snapshot file (default: lesson_cache_snapshot.json)
    /// - `MAX_ENTRIES`, `MAX_TOTAL_SIZE_BYTES`, `DEFAULT_TTL`,
    ///   `COMPRESSION_ENABLED`, `PERSISTENCE_ENABLED`, `OVERSIZE_RATIO`,
    ///   `SNAPSHOT_MAX_AGE` - see [`CacheConfig`]
    pub fn from_env() -> Self {
        Self {
            server_port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            sweep_interval: env_or("SWEEP_INTERVAL", DEFAULT_SWEEP_INTERVAL_SECS),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            cache: CacheConfig::from_env(),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL_SECS,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            cache: CacheConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
