use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{DomainError, SearchLimits};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub embedding: EmbeddingConfig,
    pub cache: CacheConfig,
    pub similarity: SimilarityConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and expose `GET /metrics`
    pub enabled: bool,
}

/// Embedding provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    /// Falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub snapshot_path: PathBuf,
    /// Load the snapshot at startup
    pub prewarm: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityBackendKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub backend: SimilarityBackendKind,
    /// Falls back to `DATABASE_URL` when unset
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// JSON corpus for the in-memory backend
    pub corpus_path: PathBuf,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_threshold: f32,
    pub default_max_results: usize,
    pub max_query_chars: usize,
    pub max_results_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            timeout_ms: 10_000,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured key, or `OPENAI_API_KEY` from the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl_secs: 60 * 60,
            snapshot_path: PathBuf::from("data/embedding-cache.json"),
            prewarm: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            backend: SimilarityBackendKind::default(),
            database_url: None,
            max_connections: 5,
            corpus_path: PathBuf::from("data/corpus.json"),
            timeout_ms: 10_000,
        }
    }
}

impl SimilarityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn resolve_database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let limits = SearchLimits::default();
        Self {
            default_threshold: limits.default_threshold,
            default_max_results: limits.default_max_results,
            max_query_chars: limits.max_query_chars,
            max_results_limit: limits.max_results_limit,
        }
    }
}

impl SearchConfig {
    /// Validated search limits
    pub fn limits(&self) -> Result<SearchLimits, DomainError> {
        if self.max_query_chars == 0 {
            return Err(DomainError::configuration(
                "search.max_query_chars must be greater than 0",
            ));
        }
        if self.max_results_limit == 0 {
            return Err(DomainError::configuration(
                "search.max_results_limit must be greater than 0",
            ));
        }
        if self.default_max_results == 0 || self.default_max_results > self.max_results_limit {
            return Err(DomainError::configuration(format!(
                "search.default_max_results must be between 1 and {}",
                self.max_results_limit
            )));
        }
        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(DomainError::configuration(
                "search.default_threshold must be between 0 and 1",
            ));
        }

        Ok(SearchLimits {
            max_query_chars: self.max_query_chars,
            default_threshold: self.default_threshold,
            default_max_results: self.default_max_results,
            max_results_limit: self.max_results_limit,
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
