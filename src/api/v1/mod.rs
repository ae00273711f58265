//! v1 API endpoints

pub mod keys;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/keys", post(keys::create_key))
        .route("/keys/{key_id}", delete(keys::delete_key))
        .route("/apis/{api_id}/keys", get(keys::list_keys))
}
