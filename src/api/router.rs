use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::state::AppState;
use super::v1;

/// Create the full router with application state
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        // Dropping the handler future cancels in-flight storage calls
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::events::KeyEventEmitter;
    use crate::infrastructure::storage::InMemoryStorage;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_serves_health_behind_timeout_layer() {
        let state = crate::create_app_state_with(Arc::new(InMemoryStorage::new()), KeyEventEmitter::disabled());
        let router = create_router(state, Duration::from_secs(5));

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
