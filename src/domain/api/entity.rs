//! Api entity and authentication mode

use serde::{Deserialize, Serialize};

use crate::domain::id::{new_id, prefix};

/// Authentication mode of an Api
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Key,
    Jwt,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Jwt => "jwt",
        }
    }

    /// Parse a stored value; unknown values yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "key" => Some(Self::Key),
            "jwt" => Some(Self::Jwt),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Api entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    pub id: String,
    pub name: String,
    pub workspace_id: String,
    pub auth_type: AuthType,
    /// Present iff `auth_type` is `Key`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_auth_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_whitelist: Option<Vec<String>>,
}

impl Api {
    /// Create an Api that authenticates with keys from the given namespace
    pub fn with_key_auth(
        name: impl Into<String>,
        workspace_id: impl Into<String>,
        key_auth_id: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(prefix::API),
            name: name.into(),
            workspace_id: workspace_id.into(),
            auth_type: AuthType::Key,
            key_auth_id: Some(key_auth_id.into()),
            ip_whitelist: None,
        }
    }

    /// Create an Api that authenticates with JWTs
    pub fn with_jwt_auth(name: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self {
            id: new_id(prefix::API),
            name: name.into(),
            workspace_id: workspace_id.into(),
            auth_type: AuthType::Jwt,
            key_auth_id: None,
            ip_whitelist: None,
        }
    }

    pub fn with_ip_whitelist(mut self, ips: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ip_whitelist = Some(ips.into_iter().map(Into::into).collect());
        self
    }

    /// The KeyAuth namespace keys may be issued into, if this Api is set up for key auth
    pub fn issuable_key_auth_id(&self) -> Option<&str> {
        match (self.auth_type, self.key_auth_id.as_deref()) {
            (AuthType::Key, Some(id)) if !id.is_empty() => Some(id),
            _ => None,
        }
    }
}
