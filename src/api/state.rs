//! Application state shared across handlers

use std::sync::Arc;

use crate::domain::SimilarityBackend;
use crate::infrastructure::embedding_cache::EmbeddingCache;
use crate::infrastructure::services::SemanticSearchService;

#[derive(Clone)]
pub struct AppState {
    pub search_service: Arc<SemanticSearchService>,
    pub cache: Arc<EmbeddingCache>,
    pub backend: Arc<dyn SimilarityBackend>,
}

impl AppState {
    pub fn new(
        search_service: Arc<SemanticSearchService>,
        cache: Arc<EmbeddingCache>,
        backend: Arc<dyn SimilarityBackend>,
    ) -> Self {
        Self {
            search_service,
            cache,
            backend,
        }
    }
}
