//! PostgreSQL similarity backend
//!
//! Relies on the `search_ayahs_semantic_jsonb` / `search_hadiths_semantic_jsonb`
//! functions installed alongside the corpus tables. Both take
//! `(query_embedding jsonb, language text, min_similarity float, limit int)`
//! and return `(id, similarity)` rows.

use std::fmt::Debug;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::domain::{ContentType, DomainError, Language, SimilarityBackend, SimilarityCandidate};

/// Maximum snippet length returned per hit, in characters
const SNIPPET_CHARS: usize = 280;

/// Similarity backend over the corpus tables in PostgreSQL
pub struct PgvectorSimilarityBackend {
    pool: PgPool,
}

impl Debug for PgvectorSimilarityBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgvectorSimilarityBackend")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PgvectorSimilarityBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a backend whose pool connects on first use
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)
            .map_err(|e| DomainError::configuration(format!("Invalid database URL: {}", e)))?;

        Ok(Self::new(pool))
    }

    fn search_sql(content_type: ContentType, language: Language) -> String {
        let (function, join, snippet) = match (content_type, language) {
            (ContentType::Ayah, Language::Arabic) => (
                "search_ayahs_semantic_jsonb",
                "JOIN ayahs c ON c.id = r.id",
                "c.text_arabic",
            ),
            (ContentType::Ayah, Language::English) => (
                "search_ayahs_semantic_jsonb",
                "JOIN ayahs c ON c.id = r.id",
                "(SELECT t.text FROM translations t WHERE t.ayah_id = c.id ORDER BY t.translator_id LIMIT 1)",
            ),
            (ContentType::Hadith, Language::Arabic) => (
                "search_hadiths_semantic_jsonb",
                "JOIN hadiths c ON c.id = r.id",
                "c.text_arabic",
            ),
            (ContentType::Hadith, Language::English) => (
                "search_hadiths_semantic_jsonb",
                "JOIN hadiths c ON c.id = r.id",
                "c.text_english",
            ),
        };

        format!(
            r#"
            SELECT
                r.id::bigint AS id,
                r.similarity::real AS score,
                LEFT(COALESCE({snippet}, ''), {chars}) AS snippet
            FROM {function}($1::jsonb, $2::text, $3::float, $4::int) r
            {join}
            ORDER BY r.similarity DESC
            "#,
            snippet = snippet,
            chars = SNIPPET_CHARS,
            function = function,
            join = join,
        )
    }
}

#[async_trait]
impl SimilarityBackend for PgvectorSimilarityBackend {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        content_type: ContentType,
        language: Language,
        top_k: usize,
    ) -> Result<Vec<SimilarityCandidate>, DomainError> {
        let query = Self::search_sql(content_type, language);
        let embedding_json = serde_json::to_value(embedding)
            .map_err(|e| DomainError::internal(format!("Failed to encode embedding: {}", e)))?;
        let limit = i32::try_from(top_k).unwrap_or(i32::MAX);

        tracing::debug!(
            content_type = %content_type,
            language = %language,
            top_k,
            "Running similarity query"
        );

        // Thresholding happens in the orchestrator, so ask for every candidate
        let rows = sqlx::query(&query)
            .bind(embedding_json)
            .bind(language.as_str())
            .bind(0.0_f64)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DomainError::provider("postgres", format!("Similarity query failed: {}", e))
            })?;

        rows.iter()
            .map(|row| {
                let id: i64 = row.try_get("id")?;
                let score: f32 = row.try_get("score")?;
                let snippet: String = row.try_get("snippet")?;
                Ok(SimilarityCandidate::new(id, clamp_score(score), snippet))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| DomainError::provider("postgres", format!("Malformed result row: {}", e)))
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::provider("postgres", format!("Health check failed: {}", e)))?;

        let _: i32 = row.get(0);
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Pin a database score to `[0, 1]`; NaN passes through for the ranker to reject
fn clamp_score(score: f32) -> f32 {
    score.clamp(0.0, 1.0)
}
