//! API Handlers
//!
//! HTTP request handlers through which the generation pipeline and the
//! performance governor reach the shared cache.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::cache::{shared, CacheStats, CacheStore, FilePersistence, RequestDescriptor, SharedCache};
use crate::config::{CacheConfig, CacheConfigUpdate, Config};
use crate::error::{CacheError, Result};
use crate::models::{
    validate_descriptor, CacheResponseRequest, DeleteResponse, GetResponse, HealthResponse,
    MessageResponse, SetRequest, SetResponse,
};
use crate::tasks::{spawn_sweep_task, SweepTask};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The shared cache instance
    pub cache: SharedCache,
    /// Expiration sweep bound to this cache; it stops when the last clone
    /// of the state is dropped
    sweep: Option<Arc<SweepTask>>,
}

impl AppState {
    /// Wraps a store without a background sweep; expired entries are only
    /// removed lazily.
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache: shared(cache),
            sweep: None,
        }
    }

    /// Wraps a store and starts its expiration sweep. Must be called from
    /// within a tokio runtime.
    pub fn with_sweep(cache: CacheStore, interval: Duration) -> Self {
        let cache = shared(cache);
        let sweep = spawn_sweep_task(cache.clone(), interval);
        Self {
            cache,
            sweep: Some(Arc::new(sweep)),
        }
    }

    /// Opens the cache described by `config`, restoring its snapshot file,
    /// and starts the sweep at the configured interval.
    pub fn from_config(config: &Config) -> Self {
        let persistence = FilePersistence::new(config.snapshot_path.clone());
        Self::with_sweep(
            CacheStore::open(config.cache.clone(), Box::new(persistence)),
            config.sweep_interval(),
        )
    }

    /// Stops the expiration sweep, if one is running.
    pub fn stop_sweep(&self) {
        if let Some(sweep) = &self.sweep {
            sweep.stop();
        }
    }

    pub fn sweep_running(&self) -> bool {
        self.sweep.as_ref().is_some_and(|s| !s.is_finished())
    }
}

/// Handler for POST /responses/lookup
///
/// Looks up a generated response by its request descriptor.
pub async fn lookup_response_handler(
    State(state): State<AppState>,
    Json(descriptor): Json<RequestDescriptor>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = validate_descriptor(&descriptor) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let key = descriptor.cache_key();
    // Write lock: lookups update recency and counters
    let mut cache = state.cache.write().await;
    match cache.get_cached_ai_response::<Value>(&descriptor) {
        Some(response) => Ok(Json(GetResponse::new(key, response))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for PUT /responses
///
/// Caches a freshly generated response under its descriptor's key.
pub async fn cache_response_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheResponseRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    let response = match cache.try_cache_ai_response(&req.descriptor, &req.response) {
        Ok(key) => SetResponse::cached(key),
        Err(e) => SetResponse::skipped(req.descriptor.cache_key(), e),
    };
    Ok(Json(response))
}

/// Handler for GET /entries/:key
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let mut cache = state.cache.write().await;
    match cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for PUT /entries
pub async fn set_entry_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs);
    let mut cache = state.cache.write().await;
    let response = match cache.try_set(req.key.clone(), req.value, ttl) {
        Ok(()) => SetResponse::cached(req.key),
        Err(e) => SetResponse::skipped(req.key, e),
    };
    Ok(Json(response))
}

/// Handler for DELETE /entries/:key
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    if cache.delete(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /clear
///
/// The stored snapshot is removed on the blocking pool after the lock is
/// released.
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    let persistence = {
        let mut cache = state.cache.write().await;
        cache.clear_memory();
        cache.persistence()
    };

    if let Some(port) = persistence {
        match tokio::task::spawn_blocking(move || port.remove()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Could not delete cache snapshot: {}", e),
            Err(e) => warn!("Snapshot removal task failed: {}", e),
        }
    }
    Json(MessageResponse::new("Cache cleared"))
}

/// Handler for PATCH /config
///
/// Returns the configuration now in effect.
pub async fn update_config_handler(
    State(state): State<AppState>,
    Json(update): Json<CacheConfigUpdate>,
) -> Result<Json<CacheConfig>> {
    let mut cache = state.cache.write().await;
    cache.update_config(update)?;
    Ok(Json(cache.config().clone()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    let cache = state.cache.read().await;
    Json(cache.stats())
}

/// Handler for GET /snapshot
///
/// Debug export of every entry with its metadata.
pub async fn snapshot_handler(State(state): State<AppState>) -> Json<Value> {
    let cache = state.cache.read().await;
    Json(cache.export_snapshot())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
