//! Embedding provider trait definition

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

/// Turns text into a fixed-length vector (OpenAI, local models, etc.)
///
/// Implementations return an error when the upstream service is unreachable
/// or answers with something that is not an embedding.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the model identifier used for every request
    fn model(&self) -> &str;
}
