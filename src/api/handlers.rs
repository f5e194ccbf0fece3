//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheDomain, CacheRegistry, RegistryStats, SharedCache, StatsSnapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CleanupResponse, ClearResponse, EntryQuery, GetResponse, HealthResponse,
    InvalidatePatternRequest, InvalidateResponse, PatternResponse, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: CacheRegistry,
}

impl AppState {
    pub fn new(registry: CacheRegistry) -> Self {
        Self { registry }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheRegistry::from_config(config))
    }

    /// Looks up the cache named in a request path.
    fn cache(&self, domain: &str) -> Result<&SharedCache<Value>> {
        let domain: CacheDomain = domain.parse().map_err(CacheError::UnknownCache)?;
        Ok(self.registry.cache(domain))
    }
}

/// Handler for PUT /caches/:domain/entries
pub async fn set_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache(&domain)?.write().await;
    let key = cache.key_for(&req.identifier, req.params.as_ref());
    cache.set(&req.identifier, req.value, req.params.as_ref(), req.ttl);

    Ok(Json(SetResponse::new(key)))
}

/// Handler for GET /caches/:domain/entries
pub async fn get_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<GetResponse>> {
    let params = query.parsed_params().map_err(CacheError::InvalidRequest)?;

    // Write lock: an expired hit is removed during the lookup
    let mut cache = state.cache(&domain)?.write().await;
    let key = cache.key_for(&query.identifier, params.as_ref());
    let value = cache
        .get(&query.identifier, params.as_ref())
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /caches/:domain/entries
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<InvalidateResponse>> {
    let params = query.parsed_params().map_err(CacheError::InvalidRequest)?;

    let mut cache = state.cache(&domain)?.write().await;
    let key = cache.key_for(&query.identifier, params.as_ref());
    let removed = cache.invalidate(&query.identifier, params.as_ref());

    Ok(Json(InvalidateResponse { key, removed }))
}

/// Handler for POST /caches/:domain/invalidate
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<PatternResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state
        .cache(&domain)?
        .write()
        .await
        .invalidate_pattern(&req.pattern);

    Ok(Json(PatternResponse {
        pattern: req.pattern,
        removed,
    }))
}

/// Handler for POST /caches/:domain/cleanup
pub async fn cleanup_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<CleanupResponse>> {
    let removed = state.cache(&domain)?.write().await.cleanup();
    Ok(Json(CleanupResponse { removed }))
}

/// Handler for DELETE /caches/:domain
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<ClearResponse>> {
    state.cache(&domain)?.write().await.clear();
    Ok(Json(ClearResponse::new(domain)))
}

/// Handler for DELETE /caches
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.registry.invalidate_all().await;
    Json(ClearResponse::new("all caches"))
}

/// Handler for GET /caches/:domain/stats
pub async fn cache_stats_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<StatsSnapshot>> {
    let stats = state.cache(&domain)?.read().await.stats();
    Ok(Json(stats))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.registry.stats().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
