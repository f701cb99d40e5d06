use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::search;
use super::state::AppState;
use super::types::ApiError;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/search", search::create_search_router())
        .nest("/admin", admin::create_admin_router());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api", api)
        .fallback(|| async { ApiError::not_found("No route for this path") })
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
