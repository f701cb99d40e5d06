//! Search request validation

use std::fmt;

use super::{ContentType, Language};
use crate::domain::DomainError;

/// Limits and defaults applied while validating search input
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Maximum query length in characters, after trimming
    pub max_query_chars: usize,
    pub default_threshold: f32,
    pub default_max_results: usize,
    /// Requests above this are clamped, not rejected
    pub max_results_limit: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_query_chars: 500,
            default_threshold: 0.7,
            default_max_results: 20,
            max_results_limit: 100,
        }
    }
}

/// Query validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValidationError {
    EmptyQuery,
    QueryTooLong { length: usize, max: usize },
    InvalidLanguage,
    InvalidThreshold { value: f64 },
    InvalidMaxResults { value: i64 },
    EmptyTypes,
    UnknownType { value: String },
}

impl fmt::Display for QueryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "Query is required and must be a non-empty string"),
            Self::QueryTooLong { length, max } => write!(
                f,
                "Query must be at most {} characters (got {})",
                max, length
            ),
            Self::InvalidLanguage => {
                write!(f, "Language must be either \"arabic\" or \"english\"")
            }
            Self::InvalidThreshold { value } => write!(
                f,
                "Similarity threshold must be between 0 and 1 (got {})",
                value
            ),
            Self::InvalidMaxResults { value } => {
                write!(f, "maxResults must be greater than 0 (got {})", value)
            }
            Self::EmptyTypes => write!(f, "types must contain \"ayah\", \"hadith\" or both"),
            Self::UnknownType { value } => write!(
                f,
                "Unknown content type '{}': must be \"ayah\" or \"hadith\"",
                value
            ),
        }
    }
}

impl From<QueryValidationError> for DomainError {
    fn from(err: QueryValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Unvalidated search input as received from a caller
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
    pub query: String,
    pub language: Option<String>,
    pub similarity_threshold: Option<f64>,
    pub max_results: Option<i64>,
    pub types: Option<Vec<String>>,
}

impl SearchInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn with_max_results(mut self, max_results: i64) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Validate the input and fill in defaults
    pub fn validate(&self, limits: &SearchLimits) -> Result<SemanticQuery, QueryValidationError> {
        let query = self.query.trim();

        if query.is_empty() {
            return Err(QueryValidationError::EmptyQuery);
        }

        let length = query.chars().count();
        if length > limits.max_query_chars {
            return Err(QueryValidationError::QueryTooLong {
                length,
                max: limits.max_query_chars,
            });
        }

        let language = match self.language.as_deref() {
            None => Language::default(),
            Some(raw) => raw
                .parse()
                .map_err(|_| QueryValidationError::InvalidLanguage)?,
        };

        let similarity_threshold = match self.similarity_threshold {
            None => limits.default_threshold,
            Some(value) if value.is_finite() && (0.0..=1.0).contains(&value) => value as f32,
            Some(value) => return Err(QueryValidationError::InvalidThreshold { value }),
        };

        let max_results = match self.max_results {
            None => limits.default_max_results,
            Some(value) if value > 0 => (value as u64).min(limits.max_results_limit as u64) as usize,
            Some(value) => return Err(QueryValidationError::InvalidMaxResults { value }),
        };

        let types = match &self.types {
            None => ContentType::ALL.to_vec(),
            Some(raw) => parse_types(raw)?,
        };

        Ok(SemanticQuery {
            query: query.to_string(),
            language,
            similarity_threshold,
            max_results,
            types,
        })
    }
}

fn parse_types(raw: &[String]) -> Result<Vec<ContentType>, QueryValidationError> {
    if raw.is_empty() {
        return Err(QueryValidationError::EmptyTypes);
    }

    let mut types = Vec::with_capacity(ContentType::ALL.len());
    for value in raw {
        let content_type: ContentType = value
            .parse()
            .map_err(|_| QueryValidationError::UnknownType {
                value: value.clone(),
            })?;
        types.push(content_type);
    }

    types.sort();
    types.dedup();
    Ok(types)
}

/// A validated search with every parameter resolved
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticQuery {
    /// Trimmed query text
    pub query: String,
    pub language: Language,
    pub similarity_threshold: f32,
    pub max_results: usize,
    /// Distinct, in ayah-then-hadith order
    pub types: Vec<ContentType>,
}
