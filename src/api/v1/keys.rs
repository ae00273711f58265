//! Key management endpoint handlers

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use tracing::debug;

use crate::api::middleware::RootKeyCredential;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, CreateKeyResponse, DeleteKeyResponse, Json, KeyView, ListKeysResponse,
};
use crate::infrastructure::key::{CreateKeyRequest, ListKeysQuery};

/// POST /v1/keys
pub async fn create_key(
    State(state): State<AppState>,
    credential: RootKeyCredential,
    Json(request): Json<CreateKeyRequest>,
) -> Result<Json<CreateKeyResponse>, ApiError> {
    debug!(api_id = %request.api_id, "Creating key");

    let created = state
        .key_service
        .create_key(credential.as_deref(), request)
        .await?;

    Ok(Json(created.into()))
}

/// GET /v1/apis/{api_id}/keys
pub async fn list_keys(
    State(state): State<AppState>,
    credential: RootKeyCredential,
    Path(api_id): Path<String>,
    query: Result<Query<ListKeysQuery>, QueryRejection>,
) -> Result<Json<ListKeysResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let page = state
        .key_service
        .list_keys(credential.as_deref(), &api_id, query)
        .await?;

    let keys = page
        .keys
        .into_iter()
        .map(|key| KeyView::new(key, &page.api_id))
        .collect();

    Ok(Json(ListKeysResponse {
        keys,
        total: page.total,
    }))
}

/// DELETE /v1/keys/{key_id}
pub async fn delete_key(
    State(state): State<AppState>,
    credential: RootKeyCredential,
    Path(key_id): Path<String>,
) -> Result<Json<DeleteKeyResponse>, ApiError> {
    debug!(key_id = %key_id, "Deleting key");

    state
        .key_service
        .delete_key(credential.as_deref(), &key_id)
        .await?;

    Ok(Json(DeleteKeyResponse::default()))
}
