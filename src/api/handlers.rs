//! API Handlers
//!
//! HTTP request handlers mapping each endpoint onto one cache operation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::cache::{Cache, SetEntry};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HasResponse, HealthResponse, InvalidateRequest, KeysResponse,
    MessageResponse, MultiGetRequest, MultiGetResponse, MultiSetRequest, RemovedResponse,
    SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the explicitly constructed cache instance served by this process.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache handle
    pub cache: Cache<Value>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Cache<Value>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Cache::new(config.cache.clone())?))
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let SetEntry {
        key,
        value,
        ttl,
        tags,
    } = req.into_entry();
    state.cache.set(key.clone(), value, ttl, tags).await?;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for PUT /mset
pub async fn multi_set_handler(
    State(state): State<AppState>,
    Json(req): Json<MultiSetRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let count = req.entries.len();
    let entries = req.entries.into_iter().map(SetRequest::into_entry).collect();
    state.cache.set_multiple(entries).await?;

    Ok(Json(MessageResponse::new(format!("{} keys set", count))))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for POST /mget
pub async fn multi_get_handler(
    State(state): State<AppState>,
    Json(req): Json<MultiGetRequest>,
) -> Json<MultiGetResponse> {
    let values = state.cache.get_multiple(&req.keys).await;
    Json(MultiGetResponse { values })
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key).await {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let exists = state.cache.has(&key).await;
    Json(HasResponse { key, exists })
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache.keys().await))
}

/// Handler for POST /invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<RemovedResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.invalidate_by_tags(&req.tags).await;
    Ok(Json(RemovedResponse { removed }))
}

/// Handler for POST /cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.cleanup().await;
    Json(RemovedResponse { removed })
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.clear().await;
    Json(MessageResponse::new("Cache cleared"))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.metrics().await))
}

/// Handler for POST /stats/reset
pub async fn reset_stats_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.reset_metrics().await;
    Json(MessageResponse::new("Metrics reset"))
}

/// Handler for GET /export
///
/// Returns the snapshot blob verbatim as the response body.
pub async fn export_handler(State(state): State<AppState>) -> Result<String> {
    state.cache.export().await
}

/// Handler for POST /import
///
/// The request body is the snapshot blob produced by `/export`.
pub async fn import_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    if state.cache.import(&body).await {
        Ok((StatusCode::OK, Json(MessageResponse::new("Snapshot imported"))))
    } else {
        Err(CacheError::Snapshot(
            "snapshot could not be imported".to_string(),
        ))
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
