//! Similarity backend trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{ContentType, Language, SimilarityCandidate};
use crate::domain::DomainError;

/// Vector/text similarity store queried by the search orchestrator
///
/// Implementations return candidates ordered by score descending, at most
/// `top_k` of them. Scores are similarities in `[0, 1]`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Find the entries of one content type closest to `embedding`
    async fn similarity_search(
        &self,
        embedding: &[f32],
        content_type: ContentType,
        language: Language,
        top_k: usize,
    ) -> Result<Vec<SimilarityCandidate>, DomainError>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<bool, DomainError>;

    /// Get the backend name
    fn backend_name(&self) -> &'static str;
}
