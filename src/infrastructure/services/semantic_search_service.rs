//! Semantic search orchestration
//!
//! Validates a search request, resolves the query embedding through the
//! embedding cache (calling the provider on a miss), fans out one similarity
//! search per requested content type and merges the thresholded candidates
//! into a single ranked list.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::domain::{
    ContentType, DomainError, EmbeddingProvider, Language, SearchInput, SearchLimits,
    SearchResult, SemanticQuery, SimilarityBackend,
};
use crate::infrastructure::embedding_cache::EmbeddingCache;

/// Timeouts and validation limits for the search service
#[derive(Debug, Clone)]
pub struct SemanticSearchConfig {
    pub limits: SearchLimits,
    pub provider_timeout: Duration,
    pub backend_timeout: Duration,
}

impl Default for SemanticSearchConfig {
    fn default() -> Self {
        Self {
            limits: SearchLimits::default(),
            provider_timeout: Duration::from_secs(10),
            backend_timeout: Duration::from_secs(10),
        }
    }
}

impl SemanticSearchConfig {
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }
}

/// Result of one semantic search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The effective parameters after validation and defaulting
    pub query: SemanticQuery,
    pub results: Vec<SearchResult>,
    pub elapsed: Duration,
    /// Whether the query embedding was served from the cache
    pub cache_hit: bool,
    pub model: String,
}

impl SearchOutcome {
    pub fn search_time_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Semantic search over the ayah and hadith corpus
pub struct SemanticSearchService {
    cache: Arc<EmbeddingCache>,
    provider: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn SimilarityBackend>,
    config: SemanticSearchConfig,
}

impl Debug for SemanticSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticSearchService")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model())
            .field("backend", &self.backend.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

impl SemanticSearchService {
    pub fn new(
        cache: Arc<EmbeddingCache>,
        provider: Arc<dyn EmbeddingProvider>,
        backend: Arc<dyn SimilarityBackend>,
    ) -> Self {
        Self::with_config(cache, provider, backend, SemanticSearchConfig::default())
    }

    pub fn with_config(
        cache: Arc<EmbeddingCache>,
        provider: Arc<dyn EmbeddingProvider>,
        backend: Arc<dyn SimilarityBackend>,
        config: SemanticSearchConfig,
    ) -> Self {
        Self {
            cache,
            provider,
            backend,
            config,
        }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.config.limits
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Run one semantic search
    ///
    /// Invalid input is rejected before the cache or the provider is touched.
    /// Provider and backend failures, including timeouts, surface as
    /// [`DomainError::Provider`] and never leave an entry in the cache.
    pub async fn search(&self, input: &SearchInput) -> Result<SearchOutcome, DomainError> {
        let started = Instant::now();

        let query = match input.validate(&self.config.limits) {
            Ok(query) => query,
            Err(e) => {
                counter!("semantic_search_requests_total", "outcome" => "invalid").increment(1);
                return Err(e.into());
            }
        };

        let result = self.execute(query).await;
        let elapsed = started.elapsed();
        histogram!("semantic_search_duration_seconds").record(elapsed.as_secs_f64());

        match result {
            Ok((query, results, cache_hit)) => {
                counter!("semantic_search_requests_total", "outcome" => "success").increment(1);
                info!(
                    query = %query.query,
                    language = %query.language,
                    count = results.len(),
                    cache_hit,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Semantic search completed"
                );

                Ok(SearchOutcome {
                    query,
                    results,
                    elapsed,
                    cache_hit,
                    model: self.provider.model().to_string(),
                })
            }
            Err(e) => {
                let outcome = if e.is_upstream() { "unavailable" } else { "error" };
                counter!("semantic_search_requests_total", "outcome" => outcome).increment(1);
                warn!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "Semantic search failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        query: SemanticQuery,
    ) -> Result<(SemanticQuery, Vec<SearchResult>, bool), DomainError> {
        let (embedding, cache_hit) = self.query_embedding(&query.query).await?;

        let searches = query.types.iter().map(|&content_type| {
            self.search_content_type(&embedding, content_type, query.language, query.max_results)
        });
        let per_type = try_join_all(searches).await?;

        let results = rank(per_type, query.similarity_threshold, query.max_results)?;

        Ok((query, results, cache_hit))
    }

    async fn query_embedding(&self, query: &str) -> Result<(Vec<f32>, bool), DomainError> {
        if let Some(embedding) = self.cache.get(query) {
            debug!(query = %query, "Query embedding served from cache");
            return Ok((embedding, true));
        }

        let provider_name = self.provider.provider_name();
        let embedding = with_timeout(
            provider_name,
            self.config.provider_timeout,
            self.provider.embed(query),
        )
        .await?;

        if embedding.is_empty() {
            return Err(DomainError::provider(
                provider_name,
                "Embedding provider returned an empty vector",
            ));
        }

        self.cache.set(query, embedding.clone());
        Ok((embedding, false))
    }

    async fn search_content_type(
        &self,
        embedding: &[f32],
        content_type: ContentType,
        language: Language,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let candidates = with_timeout(
            self.backend.backend_name(),
            self.config.backend_timeout,
            self.backend
                .similarity_search(embedding, content_type, language, top_k),
        )
        .await?;

        debug!(
            content_type = %content_type,
            candidates = candidates.len(),
            "Similarity search returned"
        );

        Ok(candidates
            .into_iter()
            .map(|candidate| SearchResult::from_candidate(candidate, content_type, language))
            .collect())
    }
}

/// Await an upstream call, mapping timeouts and foreign errors to provider errors
async fn with_timeout<T, F>(
    upstream: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e @ DomainError::Provider { .. })) => Err(e),
        Ok(Err(e)) => Err(DomainError::provider(upstream, e.to_string())),
        Err(_) => Err(DomainError::provider(
            upstream,
            format!("Request timed out after {}ms", timeout.as_millis()),
        )),
    }
}

/// Threshold, merge and truncate per-type result lists
///
/// Lists are concatenated in the order given before a stable sort, so equal
/// scores keep backend order and earlier content types first.
fn rank(
    per_type: Vec<Vec<SearchResult>>,
    threshold: f32,
    max_results: usize,
) -> Result<Vec<SearchResult>, DomainError> {
    let mut merged = Vec::new();

    for result in per_type.into_iter().flatten() {
        if !result.score.is_finite() {
            return Err(DomainError::internal(format!(
                "Non-finite similarity score for {} {}",
                result.content_type, result.id
            )));
        }
        if result.score >= threshold {
            merged.push(result);
        }
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(max_results);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::search::MockSimilarityBackend;
    use crate::domain::SimilarityCandidate;
    use crate::infrastructure::embedding_cache::EmbeddingCacheConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider returning a fixed vector and counting calls
    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.1, 0.2, 0.3])
        }

        fn provider_name(&self) -> &'static str {
            "counting"
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    fn cache() -> Arc<EmbeddingCache> {
        Arc::new(EmbeddingCache::new(EmbeddingCacheConfig::default()).unwrap())
    }

    fn candidates(content_type: ContentType) -> Vec<SimilarityCandidate> {
        match content_type {
            ContentType::Ayah => vec![
                SimilarityCandidate::new(1, 0.92, "Indeed, with hardship comes ease"),
                SimilarityCandidate::new(2, 0.81, "Seek help through patience and prayer"),
                SimilarityCandidate::new(3, 0.60, "And give good tidings to the patient"),
            ],
            ContentType::Hadith => vec![
                SimilarityCandidate::new(10, 0.88, "How wonderful is the affair of the believer"),
                SimilarityCandidate::new(11, 0.76, "Patience is at the first stroke"),
                SimilarityCandidate::new(12, 0.40, "The strong man is not the good wrestler"),
            ],
        }
    }

    fn corpus_backend() -> MockSimilarityBackend {
        let mut backend = MockSimilarityBackend::new();
        backend
            .expect_similarity_search()
            .returning(|_, content_type, _, top_k| {
                let mut found = candidates(content_type);
                found.truncate(top_k);
                Ok(found)
            });
        backend.expect_backend_name().return_const("mock");
        backend
    }

    fn scenario_input() -> SearchInput {
        SearchInput::new("patience in hardship")
            .with_language("english")
            .with_similarity_threshold(0.75)
            .with_max_results(5)
            .with_types(["ayah", "hadith"])
    }

    #[tokio::test]
    async fn test_end_to_end_repeat_served_from_cache() {
        let provider = Arc::new(CountingProvider::default());
        let service = SemanticSearchService::new(cache(), provider.clone(), Arc::new(corpus_backend()));

        let first = service.search(&scenario_input()).await.unwrap();

        assert!(!first.cache_hit);
        assert!(first.results.len() <= 5);
        assert!(first.results.iter().all(|r| r.score >= 0.75));
        assert!(first.results.iter().all(|r| r.language == Language::English));
        assert_eq!(
            first.results.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 10, 2, 11]
        );
        assert_eq!(first.model, "test-model");

        let second = service.search(&scenario_input()).await.unwrap();

        assert!(second.cache_hit);
        assert_eq!(provider.calls(), 1);
        assert_eq!(second.results, first.results);
    }

    #[tokio::test]
    async fn test_normalized_query_hits_cache() {
        let provider = Arc::new(CountingProvider::default());
        let service = SemanticSearchService::new(cache(), provider.clone(), Arc::new(corpus_backend()));

        service.search(&SearchInput::new("Patience  in hardship")).await.unwrap();
        let second = service.search(&SearchInput::new("patience in hardship ")).await.unwrap();

        assert!(second.cache_hit);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_touches_nothing() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().times(0);
        let mut backend = MockSimilarityBackend::new();
        backend.expect_similarity_search().times(0);
        let cache = cache();
        let service = SemanticSearchService::new(cache.clone(), Arc::new(provider), Arc::new(backend));

        for input in [
            SearchInput::new("   "),
            SearchInput::new("a".repeat(501)),
            SearchInput::new("mercy").with_language("latin"),
            SearchInput::new("mercy").with_similarity_threshold(1.5),
        ] {
            let result = service.search(&input).await;
            assert!(matches!(result, Err(DomainError::Validation { .. })));
        }

        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_upstream_and_not_cached() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_embed()
            .times(1)
            .returning(|_| Err(DomainError::provider("openai", "connection refused")));
        provider.expect_provider_name().return_const("openai");
        let mut backend = MockSimilarityBackend::new();
        backend.expect_similarity_search().times(0);
        let cache = cache();
        let service = SemanticSearchService::new(cache.clone(), Arc::new(provider), Arc::new(backend));

        let result = service.search(&SearchInput::new("mercy")).await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_empty_embedding_is_upstream_and_not_cached() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().returning(|_| Ok(Vec::new()));
        provider.expect_provider_name().return_const("openai");
        let cache = cache();
        let service = SemanticSearchService::new(
            cache.clone(),
            Arc::new(provider),
            Arc::new(MockSimilarityBackend::new()),
        );

        let result = service.search(&SearchInput::new("mercy")).await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
        assert!(cache.is_empty());
    }

    #[derive(Debug)]
    struct SlowProvider;

    #[async_trait]
    impl EmbeddingProvider for SlowProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, DomainError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![1.0])
        }

        fn provider_name(&self) -> &'static str {
            "slow"
        }

        fn model(&self) -> &str {
            "slow-model"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_is_upstream_and_not_cached() {
        let cache = cache();
        let config = SemanticSearchConfig::default().with_provider_timeout(Duration::from_millis(50));
        let service = SemanticSearchService::with_config(
            cache.clone(),
            Arc::new(SlowProvider),
            Arc::new(MockSimilarityBackend::new()),
            config,
        );

        let result = service.search(&SearchInput::new("mercy")).await;

        match result {
            Err(DomainError::Provider { provider, message }) => {
                assert_eq!(provider, "slow");
                assert!(message.contains("timed out"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
        assert!(cache.is_empty());
    }

    #[derive(Debug)]
    struct SlowBackend;

    #[async_trait]
    impl SimilarityBackend for SlowBackend {
        async fn similarity_search(
            &self,
            _embedding: &[f32],
            _content_type: ContentType,
            _language: Language,
            _top_k: usize,
        ) -> Result<Vec<SimilarityCandidate>, DomainError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn health_check(&self) -> Result<bool, DomainError> {
            Ok(true)
        }

        fn backend_name(&self) -> &'static str {
            "slowdb"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_timeout_is_upstream_but_embedding_kept() {
        let cache = cache();
        // Provider timeout far above the sleep so only the backend bound can fire
        let config = SemanticSearchConfig::default()
            .with_provider_timeout(Duration::from_secs(120))
            .with_backend_timeout(Duration::from_millis(20));
        let service = SemanticSearchService::with_config(
            cache.clone(),
            Arc::new(CountingProvider::default()),
            Arc::new(SlowBackend),
            config,
        );

        let result = service.search(&SearchInput::new("mercy")).await;

        match result {
            Err(DomainError::Provider { provider, message }) => {
                assert_eq!(provider, "slowdb");
                assert!(message.contains("timed out"));
                assert!(message.contains("20ms"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
        assert_eq!(cache.get("mercy"), Some(vec![0.1, 0.2, 0.3]));
    }

    #[tokio::test]
    async fn test_backend_failure_is_upstream_but_embedding_kept() {
        let provider = Arc::new(CountingProvider::default());
        let mut backend = MockSimilarityBackend::new();
        backend
            .expect_similarity_search()
            .returning(|_, _, _, _| Err(DomainError::internal("relation \"ayahs\" does not exist")));
        backend.expect_backend_name().return_const("postgres");
        let cache = cache();
        let service = SemanticSearchService::new(cache.clone(), provider, Arc::new(backend));

        let result = service.search(&SearchInput::new("mercy")).await;

        match result {
            Err(DomainError::Provider { provider, .. }) => assert_eq!(provider, "postgres"),
            other => panic!("expected provider error, got {:?}", other),
        }
        // The embedding itself was valid and stays cached
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_lower_threshold_never_returns_fewer_results() {
        let service = SemanticSearchService::new(
            cache(),
            Arc::new(CountingProvider::default()),
            Arc::new(corpus_backend()),
        );

        let strict = service
            .search(&SearchInput::new("mercy").with_similarity_threshold(0.9))
            .await
            .unwrap();
        let loose = service
            .search(&SearchInput::new("mercy").with_similarity_threshold(0.5))
            .await
            .unwrap();

        assert!(loose.results.len() >= strict.results.len());
        assert!(strict.results.iter().all(|r| r.score >= 0.9));
        assert!(loose.results.iter().all(|r| r.score >= 0.5));
    }

    #[tokio::test]
    async fn test_single_type_queries_only_that_type() {
        let mut backend = MockSimilarityBackend::new();
        backend
            .expect_similarity_search()
            .withf(|_, content_type, language, top_k| {
                *content_type == ContentType::Hadith && *language == Language::Arabic && *top_k == 3
            })
            .times(1)
            .returning(|_, content_type, _, _| Ok(candidates(content_type)));
        backend.expect_backend_name().return_const("mock");
        let service = SemanticSearchService::new(
            cache(),
            Arc::new(CountingProvider::default()),
            Arc::new(backend),
        );

        let outcome = service
            .search(
                &SearchInput::new("الصبر")
                    .with_language("arabic")
                    .with_max_results(3)
                    .with_types(["hadith"]),
            )
            .await
            .unwrap();

        assert!(outcome
            .results
            .iter()
            .all(|r| r.content_type == ContentType::Hadith && r.language == Language::Arabic));
        assert_eq!(outcome.query.types, vec![ContentType::Hadith]);
    }

    fn result(content_type: ContentType, id: i64, score: f32) -> SearchResult {
        SearchResult::from_candidate(
            SimilarityCandidate::new(id, score, ""),
            content_type,
            Language::English,
        )
    }

    #[test]
    fn test_rank_merges_and_truncates() {
        let ranked = rank(
            vec![
                vec![result(ContentType::Ayah, 1, 0.8), result(ContentType::Ayah, 2, 0.75)],
                vec![result(ContentType::Hadith, 3, 0.9), result(ContentType::Hadith, 4, 0.7)],
            ],
            0.72,
            2,
        )
        .unwrap();

        assert_eq!(ranked.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[test]
    fn test_rank_ties_keep_ayah_first() {
        let ranked = rank(
            vec![
                vec![result(ContentType::Ayah, 1, 0.8)],
                vec![result(ContentType::Hadith, 2, 0.8)],
            ],
            0.0,
            10,
        )
        .unwrap();

        assert_eq!(ranked[0].content_type, ContentType::Ayah);
        assert_eq!(ranked[1].content_type, ContentType::Hadith);
    }

    #[test]
    fn test_rank_threshold_is_inclusive() {
        let ranked = rank(vec![vec![result(ContentType::Ayah, 1, 0.75)]], 0.75, 10).unwrap();
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_rank_rejects_non_finite_scores() {
        let result = rank(vec![vec![result(ContentType::Ayah, 1, f32::NAN)]], 0.5, 10);
        assert!(matches!(result, Err(DomainError::Internal { .. })));
    }
}
