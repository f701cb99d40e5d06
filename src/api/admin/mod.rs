//! Admin API endpoints

pub mod cache;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/cache/stats", get(cache::get_cache_stats))
        .route("/cache/clear", post(cache::clear_cache))
}
