//! Embedding cache administration

use axum::extract::State;
use serde::Serialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::Json;
use crate::domain::CacheStats;

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
}

/// GET /api/admin/cache/stats
pub async fn get_cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// POST /api/admin/cache/clear
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.cache.len();
    state.cache.clear();

    info!(cleared, "Embedding cache cleared");

    Json(ClearCacheResponse { cleared })
}
