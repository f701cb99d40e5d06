//! Noor Search
//!
//! Semantic search over Quran ayahs and hadiths:
//! - Query embeddings from an OpenAI-compatible provider, memoized in a
//!   bounded LRU cache with TTL
//! - One-shot cache pre-warm from a snapshot produced by the `warmup` job
//! - Similarity search against PostgreSQL or an in-memory corpus

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use api::state::AppState;
use crate::config::{EmbeddingConfig, SimilarityBackendKind, SimilarityConfig};
use domain::{EmbeddingProvider, SimilarityBackend};
use infrastructure::{
    embedding::{HttpClient, OpenAiEmbeddingProvider},
    embedding_cache::{CacheSnapshotLoader, EmbeddingCache, EmbeddingCacheConfig},
    services::{SemanticSearchConfig, SemanticSearchService},
    similarity::{InMemorySimilarityBackend, PgvectorSimilarityBackend},
};

/// Build the application state from configuration
///
/// Pre-warms the embedding cache from the snapshot file when enabled.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let provider = create_embedding_provider(&config.embedding)?;
    let backend = create_similarity_backend(&config.similarity).await?;

    create_app_state_with(config, provider, backend).await
}

/// Build the application state around already-constructed collaborators
pub async fn create_app_state_with(
    config: &AppConfig,
    provider: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn SimilarityBackend>,
) -> anyhow::Result<AppState> {
    let limits = config.search.limits()?;
    let cache = Arc::new(EmbeddingCache::new(
        EmbeddingCacheConfig::default()
            .with_max_entries(config.cache.max_entries)
            .with_ttl(config.cache.ttl()),
    )?);

    if config.cache.prewarm {
        let loader = CacheSnapshotLoader::new(cache.clone(), &config.cache.snapshot_path)
            .with_expected_model(provider.model());
        loader.load_once().await;
    }

    let search_config = SemanticSearchConfig::default()
        .with_limits(limits)
        .with_provider_timeout(config.embedding.timeout())
        .with_backend_timeout(config.similarity.timeout());

    let search_service = Arc::new(SemanticSearchService::with_config(
        cache.clone(),
        provider,
        backend.clone(),
        search_config,
    ));

    Ok(AppState::new(search_service, cache, backend))
}

/// Create the OpenAI embedding provider
pub fn create_embedding_provider(
    config: &EmbeddingConfig,
) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let api_key = config
        .resolve_api_key()
        .context("No embedding API key: set embedding.api_key or OPENAI_API_KEY")?;

    let client = HttpClient::with_timeout(config.timeout())?;
    let provider = OpenAiEmbeddingProvider::with_base_url(client, api_key, &config.base_url)
        .with_model(&config.model);

    info!(base_url = %config.base_url, model = %config.model, "Embedding provider configured");

    Ok(Arc::new(provider))
}

/// Create the configured similarity backend
pub async fn create_similarity_backend(
    config: &SimilarityConfig,
) -> anyhow::Result<Arc<dyn SimilarityBackend>> {
    match config.backend {
        SimilarityBackendKind::Postgres => {
            let database_url = config.resolve_database_url().context(
                "The postgres similarity backend needs similarity.database_url or DATABASE_URL",
            )?;
            let backend =
                PgvectorSimilarityBackend::connect_lazy(&database_url, config.max_connections)?;

            info!(max_connections = config.max_connections, "Using PostgreSQL similarity backend");
            Ok(Arc::new(backend))
        }
        SimilarityBackendKind::Memory => {
            let backend = InMemorySimilarityBackend::from_file(&config.corpus_path).await?;

            info!(
                documents = backend.len(),
                path = %config.corpus_path.display(),
                "Using in-memory similarity backend"
            );
            Ok(Arc::new(backend))
        }
    }
}
