//! API error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Machine readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    InternalServerError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::InternalServerError => write!(f, "INTERNAL_SERVER_ERROR"),
        }
    }
}

/// `{code, error}` body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub code: ErrorCode,
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status(),
            response: ApiErrorResponse {
                code,
                error: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Log the detail under a fresh reference and return only the reference to the caller
    pub fn internal(detail: &dyn std::fmt::Display) -> Self {
        let reference = Uuid::new_v4();
        tracing::error!(reference = %reference, error = %detail, "Request failed");

        Self::new(
            ErrorCode::InternalServerError,
            format!("Internal server error (reference: {})", reference),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::Validation { message }
            | DomainError::NotFound { message }
            | DomainError::Configuration { message } => Self::bad_request(message),
            DomainError::Authentication { message } | DomainError::Authorization { message } => {
                Self::unauthorized(message)
            }
            DomainError::Conflict { .. }
            | DomainError::Storage { .. }
            | DomainError::Generation { .. }
            | DomainError::Publish { .. } => Self::internal(&err),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.response.code, self.response.error)
    }
}

impl std::error::Error for ApiError {}
