//! In-memory similarity backend for development and testing

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    cosine_similarity, ContentType, DomainError, Language, SimilarityBackend, SimilarityCandidate,
};

/// One embedded corpus entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusDocument {
    pub content_type: ContentType,
    pub id: i64,
    pub language: Language,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Brute-force cosine search over a corpus held in memory
#[derive(Debug, Default)]
pub struct InMemorySimilarityBackend {
    documents: Vec<CorpusDocument>,
}

impl InMemorySimilarityBackend {
    pub fn new(documents: Vec<CorpusDocument>) -> Self {
        Self { documents }
    }

    /// Load a corpus from a JSON array of [`CorpusDocument`]
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let data = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read corpus {}: {}",
                path.display(),
                e
            ))
        })?;

        let documents: Vec<CorpusDocument> = serde_json::from_str(&data).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to parse corpus {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            documents = documents.len(),
            "Loaded in-memory corpus"
        );

        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl SimilarityBackend for InMemorySimilarityBackend {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        content_type: ContentType,
        language: Language,
        top_k: usize,
    ) -> Result<Vec<SimilarityCandidate>, DomainError> {
        let mut candidates: Vec<SimilarityCandidate> = self
            .documents
            .iter()
            .filter(|doc| doc.content_type == content_type && doc.language == language)
            .map(|doc| {
                let score = cosine_similarity(embedding, &doc.embedding).clamp(0.0, 1.0);
                SimilarityCandidate::new(doc.id, score, doc.text.clone())
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(top_k);

        Ok(candidates)
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}
