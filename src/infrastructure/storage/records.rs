//! Flat persisted record shapes
//!
//! One record per table row. Nullable columns are `Option`s; the key
//! metadata is stored as JSON text.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WorkspaceRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub tenant_id: String,
    pub internal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ApiRecord {
    pub id: String,
    pub name: String,
    pub workspace_id: String,
    pub auth_type: String,
    pub key_auth_id: Option<String>,
    pub ip_whitelist: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct KeyAuthRecord {
    pub id: String,
    pub workspace_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct KeyRecord {
    pub id: String,
    pub key_auth_id: String,
    pub workspace_id: String,
    pub hash: String,
    pub start: String,
    pub owner_id: Option<String>,
    pub name: Option<String>,
    pub meta: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub for_workspace_id: Option<String>,
    pub ratelimit_type: Option<String>,
    pub ratelimit_limit: Option<i64>,
    pub ratelimit_refill_rate: Option<i64>,
    pub ratelimit_refill_interval: Option<i64>,
    pub remaining_enabled: bool,
    pub remaining_requests: Option<i64>,
}

/// Column list shared by every key query
pub const KEY_COLUMNS: &str = "id, key_auth_id, workspace_id, hash, start, owner_id, name, meta, \
     created_at, expires, for_workspace_id, ratelimit_type, ratelimit_limit, \
     ratelimit_refill_rate, ratelimit_refill_interval, remaining_enabled, remaining_requests";
