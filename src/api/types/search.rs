//! Semantic search request and response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ContentType, Language, SearchInput, SearchResult};
use crate::infrastructure::services::SearchOutcome;

/// Accepts either `"ayah"` or `["ayah", "hadith"]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Body of `POST /api/search/semantic`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticSearchRequest {
    /// Kept loose so a missing or non-string query is reported by validation
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub similarity_threshold: Option<f64>,
    #[serde(default)]
    pub max_results: Option<i64>,
    #[serde(default)]
    pub types: Option<OneOrMany>,
}

impl From<SemanticSearchRequest> for SearchInput {
    fn from(request: SemanticSearchRequest) -> Self {
        let query = match request.query {
            Some(Value::String(query)) => query,
            _ => String::new(),
        };

        SearchInput {
            query,
            language: request.language,
            similarity_threshold: request.similarity_threshold,
            max_results: request.max_results,
            types: request.types.map(OneOrMany::into_vec),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub count: usize,
    pub search_time_ms: u64,
    pub similarity_threshold: f32,
    pub max_results: usize,
    pub types: Vec<ContentType>,
    pub model: String,
    pub cache_hit: bool,
    pub search_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticSearchResponse {
    pub success: bool,
    pub query: String,
    pub language: Language,
    pub results: Vec<SearchResult>,
    pub metadata: SearchMetadata,
}

impl From<SearchOutcome> for SemanticSearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        let search_time_ms = outcome.search_time_ms();
        let SearchOutcome {
            query,
            results,
            cache_hit,
            model,
            ..
        } = outcome;

        Self {
            success: true,
            metadata: SearchMetadata {
                count: results.len(),
                search_time_ms,
                similarity_threshold: query.similarity_threshold,
                max_results: query.max_results,
                types: query.types,
                model,
                cache_hit,
                search_type: "semantic".to_string(),
            },
            query: query.query,
            language: query.language,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_single_type_string() {
        let request: SemanticSearchRequest =
            serde_json::from_str(r#"{ "query": "mercy", "types": "hadith" }"#).unwrap();
        let input = SearchInput::from(request);

        assert_eq!(input.types, Some(vec!["hadith".to_string()]));
    }

    #[test]
    fn test_request_camel_case_fields() {
        let request: SemanticSearchRequest = serde_json::from_str(
            r#"{
                "query": "patience",
                "language": "arabic",
                "similarityThreshold": 0.8,
                "maxResults": 5,
                "types": ["ayah"]
            }"#,
        )
        .unwrap();
        let input = SearchInput::from(request);

        assert_eq!(input.query, "patience");
        assert_eq!(input.language.as_deref(), Some("arabic"));
        assert_eq!(input.similarity_threshold, Some(0.8));
        assert_eq!(input.max_results, Some(5));
    }

    #[test]
    fn test_non_string_query_becomes_empty() {
        let request: SemanticSearchRequest = serde_json::from_str(r#"{ "query": 42 }"#).unwrap();

        assert_eq!(SearchInput::from(request).query, "");
    }
}
