//! Semantic search endpoint handlers

use axum::extract::State;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, SemanticSearchRequest, SemanticSearchResponse};
use crate::domain::SearchInput;

/// POST /api/search/semantic
pub async fn semantic_search(
    State(state): State<AppState>,
    Json(request): Json<SemanticSearchRequest>,
) -> Result<Json<SemanticSearchResponse>, ApiError> {
    let input = SearchInput::from(request);
    debug!(query = %input.query, "Semantic search request");

    let outcome = state.search_service.search(&input).await?;

    Ok(Json(SemanticSearchResponse::from(outcome)))
}

/// GET /api/search/semantic
pub async fn describe_semantic_search(State(state): State<AppState>) -> Json<Value> {
    let limits = state.search_service.limits();

    Json(json!({
        "message": "Semantic Search API",
        "description": "Meaning-based search over ayahs and hadiths using text embeddings",
        "methods": ["POST"],
        "endpoint": "/api/search/semantic",
        "model": state.search_service.model(),
        "parameters": {
            "query": format!(
                "string (required) - The search query, at most {} characters",
                limits.max_query_chars
            ),
            "language": "string (optional) - \"english\" or \"arabic\", default: \"english\"",
            "similarityThreshold": format!(
                "number (optional) - 0-1, default: {}",
                limits.default_threshold
            ),
            "maxResults": format!(
                "number (optional) - Max results to return, default: {}, capped at {}",
                limits.default_max_results, limits.max_results_limit
            ),
            "types": "string or array (optional) - \"ayah\", \"hadith\", default: both",
        },
        "example": {
            "query": "How to be patient in difficult times",
            "language": "english",
            "similarityThreshold": 0.75,
            "maxResults": 10,
            "types": ["ayah", "hadith"],
        },
    }))
}
