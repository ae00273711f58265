//! Key management response bodies

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Key, Meta, Ratelimit};
use crate::infrastructure::key::CreatedKey;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyResponse {
    pub key: String,
    pub key_id: String,
}

impl From<CreatedKey> for CreateKeyResponse {
    fn from(created: CreatedKey) -> Self {
        Self {
            key: created.key,
            key_id: created.key_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemainingView {
    pub enabled: bool,
    pub remaining: i64,
}

/// Public view of a stored key. Never carries the hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyView {
    pub id: String,
    pub start: String,
    pub api_id: String,
    pub workspace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    /// Unix milliseconds
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratelimit: Option<Ratelimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<RemainingView>,
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

impl KeyView {
    pub fn new(key: Key, api_id: &str) -> Self {
        Self {
            id: key.id,
            start: key.start,
            api_id: api_id.to_string(),
            workspace_id: key.workspace_id,
            owner_id: key.owner_id,
            name: key.name,
            meta: key.meta,
            created_at: millis(key.created_at),
            expires: key.expires.map(millis),
            ratelimit: key.ratelimit,
            remaining: key.remaining.enabled.then_some(RemainingView {
                enabled: true,
                remaining: key.remaining.remaining,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListKeysResponse {
    pub keys: Vec<KeyView>,
    pub total: usize,
}

/// Serializes as `{}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteKeyResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_view_never_exposes_hash() {
        let key = Key::new("ks_1", "ws_1", "secret-digest", "pk_abcd")
            .with_owner_id("user_1")
            .with_remaining(3);
        let json = serde_json::to_value(KeyView::new(key, "api_1")).unwrap();

        assert_eq!(json["apiId"], "api_1");
        assert_eq!(json["ownerId"], "user_1");
        assert_eq!(json["remaining"]["remaining"], 3);
        assert!(json.get("hash").is_none());
        assert!(!json.to_string().contains("secret-digest"));
    }

    #[test]
    fn test_delete_response_is_empty_object() {
        assert_eq!(serde_json::to_string(&DeleteKeyResponse::default()).unwrap(), "{}");
    }
}
