//! Searchable content types and result shapes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Kind of corpus entry a result points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// A Quran verse
    Ayah,
    /// A prophetic tradition
    Hadith,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Ayah, ContentType::Hadith];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ayah => "ayah",
            Self::Hadith => "hadith",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ayah" => Ok(Self::Ayah),
            "hadith" => Ok(Self::Hadith),
            other => Err(DomainError::validation(format!(
                "Unknown content type '{}': must be \"ayah\" or \"hadith\"",
                other
            ))),
        }
    }
}

/// Language of the text a query is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Arabic,
    #[default]
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arabic => "arabic",
            Self::English => "english",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arabic" => Ok(Self::Arabic),
            "english" => Ok(Self::English),
            _ => Err(DomainError::validation(
                "Language must be either \"arabic\" or \"english\"",
            )),
        }
    }
}

/// A raw hit returned by a similarity backend for one content type
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityCandidate {
    pub id: i64,
    pub score: f32,
    pub snippet: String,
}

impl SimilarityCandidate {
    pub fn new(id: i64, score: f32, snippet: impl Into<String>) -> Self {
        Self {
            id,
            score,
            snippet: snippet.into(),
        }
    }
}

/// A ranked search hit, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub content_type: ContentType,
    pub id: i64,
    pub language: Language,
    pub score: f32,
    pub snippet: String,
}

impl SearchResult {
    pub fn from_candidate(
        candidate: SimilarityCandidate,
        content_type: ContentType,
        language: Language,
    ) -> Self {
        Self {
            content_type,
            id: candidate.id,
            language,
            score: candidate.score,
            snippet: candidate.snippet,
        }
    }
}
