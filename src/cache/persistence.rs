//! Persistence Module
//!
//! Storage port for cache snapshots plus the snapshot record itself.
//!
//! The engine only sees [`PersistencePort`]; the medium behind it can be a
//! file, an embedded store, or plain memory.

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::cache::size::compact_value;
use crate::cache::stats::PersistedStats;
use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

// == Persistence Port ==
/// A single durable record.
pub trait PersistencePort: Send + Sync + Debug {
    /// Returns the stored record, or `None` if nothing was stored yet.
    fn read(&self) -> Result<Option<Vec<u8>>>;
    /// Replaces the stored record.
    fn write(&self, bytes: &[u8]) -> Result<()>;
    /// Deletes the stored record; deleting a missing record is not an error.
    fn remove(&self) -> Result<()>;
}

// == File Persistence ==
/// Keeps the record in one file. Writes land in a sibling temp file first and
/// are renamed into place, so readers never see a half-written record.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistencePort for FilePersistence {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::PersistenceRead(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let write_err =
            |e: std::io::Error| CacheError::PersistenceWrite(format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, bytes).map_err(write_err)?;
        fs::rename(&temp, &self.path).map_err(write_err)
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::PersistenceWrite(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

// == Memory Persistence ==
/// In-process record. Clones share the same slot, so a test can hand one
/// clone to a store and inspect or pre-seed the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    record: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(bytes.into()))),
        }
    }

    /// Current record, if any.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.record.lock().ok().and_then(|r| r.clone())
    }
}

impl PersistencePort for MemoryPersistence {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        self.record
            .lock()
            .map(|r| r.clone())
            .map_err(|e| CacheError::PersistenceRead(e.to_string()))
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut record = self
            .record
            .lock()
            .map_err(|e| CacheError::PersistenceWrite(e.to_string()))?;
        *record = Some(bytes.to_vec());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let mut record = self
            .record
            .lock()
            .map_err(|e| CacheError::PersistenceWrite(e.to_string()))?;
        *record = None;
        Ok(())
    }
}

// == Snapshot ==
/// The persisted record: every entry, the request counters, and when it was
/// taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub entries: Vec<(String, CacheEntry)>,
    pub stats: PersistedStats,
    /// Unix milliseconds
    pub snapshot_at: u64,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    /// Serializes the snapshot, compacting entry payloads when asked.
    pub fn encode(&self, compact: bool) -> Result<Vec<u8>> {
        if !compact {
            return Ok(serde_json::to_vec(self)?);
        }
        let compacted = Snapshot {
            entries: self
                .entries
                .iter()
                .map(|(key, entry)| {
                    let mut entry = entry.clone();
                    entry.data = compact_value(&entry.data);
                    (key.clone(), entry)
                })
                .collect(),
            ..self.clone()
        };
        Ok(serde_json::to_vec(&compacted)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::PersistenceRead(e.to_string()))
    }

    /// Age relative to `now`, zero if the snapshot claims to be from the future.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.snapshot_at)
    }
}
