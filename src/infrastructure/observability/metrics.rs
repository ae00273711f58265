//! Prometheus metrics

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

pub const KEYS_CREATED_TOTAL: &str = "keyhub_keys_created_total";
pub const KEY_ISSUANCE_FAILURES_TOTAL: &str = "keyhub_key_issuance_failures_total";
pub const EVENT_PUBLISH_FAILURES_TOTAL: &str = "keyhub_event_publish_failures_total";

/// Handle used to render the exposition text
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global Prometheus recorder. Returns `None` when disabled or
/// when a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("keyhub_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!(path = %config.path, "Prometheus metrics initialized");

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

pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

pub fn record_key_created() {
    counter!(KEYS_CREATED_TOTAL).increment(1);
}

/// `reason` is a low-cardinality error kind such as `authorization`
pub fn record_key_issuance_failure(reason: &'static str) {
    counter!(KEY_ISSUANCE_FAILURES_TOTAL, "reason" => reason).increment(1);
}

pub fn record_event_publish_failure() {
    counter!(EVENT_PUBLISH_FAILURES_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_metrics_install_nothing() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_none());
    }

    #[test]
    fn test_recording_without_recorder_is_a_noop() {
        record_key_created();
        record_key_issuance_failure("validation");
        record_event_publish_failure();
    }
}
