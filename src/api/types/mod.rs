//! HTTP request and response types

pub mod error;
pub mod json;
pub mod keys;

pub use error::{ApiError, ApiErrorResponse, ErrorCode};
pub use json::Json;
pub use keys::{CreateKeyResponse, DeleteKeyResponse, KeyView, ListKeysResponse};
