//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_event_publish_failure, record_key_created,
    record_key_issuance_failure, PrometheusMetrics, EVENT_PUBLISH_FAILURES_TOTAL,
    KEYS_CREATED_TOTAL, KEY_ISSUANCE_FAILURES_TOTAL,
};
