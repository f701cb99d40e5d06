//! Search API endpoints

pub mod semantic;

use axum::{routing::get, Router};

use super::state::AppState;

/// Create search API router
pub fn create_search_router() -> Router<AppState> {
    Router::new().route(
        "/semantic",
        get(semantic::describe_semantic_search).post(semantic::semantic_search),
    )
}
