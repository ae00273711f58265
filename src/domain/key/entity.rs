//! Key entity and its rate-limit and quota sub-records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::{new_id, prefix};

/// Schemaless key metadata, stored and returned untouched
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Rate-limit policy carried by a key. Enforcement happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratelimit {
    #[serde(rename = "type")]
    pub kind: String,
    pub limit: i64,
    pub refill_rate: i64,
    /// Milliseconds between refills
    pub refill_interval: i64,
}

/// Usage quota. `enabled = false` means unlimited whatever `remaining` holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remaining {
    pub enabled: bool,
    pub remaining: i64,
}

impl Remaining {
    pub fn limited(remaining: i64) -> Self {
        Self {
            enabled: true,
            remaining,
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }
}

/// Issued credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub id: String,
    pub key_auth_id: String,
    /// Workspace owning the key itself
    pub workspace_id: String,
    /// Digest of the secret, unique across all keys
    pub hash: String,
    /// Leading plaintext characters for display
    pub start: String,
    pub owner_id: Option<String>,
    pub name: Option<String>,
    pub meta: Option<Meta>,
    pub created_at: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    /// Set on root keys: the only workspace they may issue keys for
    pub for_workspace_id: Option<String>,
    pub ratelimit: Option<Ratelimit>,
    pub remaining: Remaining,
}

impl Key {
    /// Create a key with a generated identifier and no optional attributes
    pub fn new(
        key_auth_id: impl Into<String>,
        workspace_id: impl Into<String>,
        hash: impl Into<String>,
        start: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(prefix::KEY),
            key_auth_id: key_auth_id.into(),
            workspace_id: workspace_id.into(),
            hash: hash.into(),
            start: start.into(),
            owner_id: None,
            name: None,
            meta: None,
            created_at: Utc::now(),
            expires: None,
            for_workspace_id: None,
            ratelimit: None,
            remaining: Remaining::unlimited(),
        }
    }

    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_expiration(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_ratelimit(mut self, ratelimit: Ratelimit) -> Self {
        self.ratelimit = Some(ratelimit);
        self
    }

    pub fn with_remaining(mut self, remaining: i64) -> Self {
        self.remaining = Remaining::limited(remaining);
        self
    }

    /// Turn this key into a root key for the given workspace
    pub fn for_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.for_workspace_id = Some(workspace_id.into());
        self
    }

    /// The workspace this root key may issue keys for; `None` for ordinary keys
    pub fn root_scope(&self) -> Option<&str> {
        self.for_workspace_id.as_deref().filter(|ws| !ws.is_empty())
    }

    pub fn is_root_key(&self) -> bool {
        self.root_scope().is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| now >= expires)
    }
}
