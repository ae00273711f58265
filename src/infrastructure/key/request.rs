//! Inputs of the key management operations

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::Meta;

pub const DEFAULT_BYTE_LENGTH: usize = 16;
pub const MAX_PAGE_SIZE: usize = 100;

fn default_byte_length() -> usize {
    DEFAULT_BYTE_LENGTH
}

fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::new("prefix_charset")
            .with_message("prefix may only contain letters and digits".into()))
    }
}

/// Body of a key creation call
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "apiId is required"))]
    pub api_id: String,

    #[validate(
        length(max = 8, message = "prefix must be at most 8 characters"),
        custom(function = "validate_prefix")
    )]
    pub prefix: Option<String>,

    #[validate(length(max = 255, message = "name must be at most 255 characters"))]
    pub name: Option<String>,

    #[serde(default = "default_byte_length")]
    #[validate(range(min = 16, max = 255, message = "byteLength must be between 16 and 255"))]
    pub byte_length: usize,

    pub owner_id: Option<String>,

    pub meta: Option<Meta>,

    /// Unix time in milliseconds; must lie in the future
    pub expires: Option<i64>,

    #[validate(nested)]
    pub ratelimit: Option<RatelimitRequest>,

    /// Number of allowed uses; absent or not positive means unlimited
    pub remaining: Option<i64>,

    /// Accepted for compatibility and ignored: the scope always comes from the root key
    pub for_workspace_id: Option<String>,
}

impl CreateKeyRequest {
    pub fn new(api_id: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            prefix: None,
            name: None,
            byte_length: DEFAULT_BYTE_LENGTH,
            owner_id: None,
            meta: None,
            expires: None,
            ratelimit: None,
            remaining: None,
            for_workspace_id: None,
        }
    }
}

/// Rate-limit policy attached to a new key
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RatelimitRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "ratelimit.type is required"))]
    pub kind: String,

    #[validate(range(min = 1, message = "ratelimit.limit must be positive"))]
    pub limit: i64,

    #[validate(range(min = 1, message = "ratelimit.refillRate must be positive"))]
    pub refill_rate: i64,

    /// Milliseconds
    #[validate(range(min = 1, message = "ratelimit.refillInterval must be positive"))]
    pub refill_interval: i64,
}

/// Paging and filtering of a key listing
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListKeysQuery {
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<usize>,

    pub offset: Option<usize>,

    pub owner_id: Option<String>,
}

impl ListKeysQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}
