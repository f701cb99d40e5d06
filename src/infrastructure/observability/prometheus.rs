//! Prometheus metrics infrastructure

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the Prometheus recorder when enabled
///
/// Without a recorder the `metrics` macros are no-ops.
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_metrics();
            tracing::info!("Prometheus metrics initialized at /metrics");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

fn describe_metrics() {
    gauge!("noor_search_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

    describe_counter!(
        "embedding_cache_hits_total",
        "Query embeddings served from the cache"
    );
    describe_counter!(
        "embedding_cache_misses_total",
        "Cache lookups that required a provider call"
    );
    describe_counter!(
        "embedding_cache_evictions_total",
        "Entries evicted to make room for newer ones"
    );
    describe_counter!(
        "semantic_search_requests_total",
        "Semantic searches by outcome"
    );
    describe_histogram!(
        "semantic_search_duration_seconds",
        Unit::Seconds,
        "Wall-clock time of a semantic search"
    );
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}
