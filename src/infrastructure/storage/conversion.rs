//! Translation between domain entities and persisted records

use thiserror::Error;

use crate::domain::{Api, AuthType, DomainError, Key, KeyAuth, Meta, Ratelimit, Remaining, Workspace};

use super::records::{ApiRecord, KeyAuthRecord, KeyRecord, WorkspaceRecord};

/// Errors raised while translating persisted records
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("unable to decode meta of key '{key_id}': {source}")]
    MetaDecode {
        key_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to encode meta of key '{key_id}': {source}")]
    MetaEncode {
        key_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown auth type '{value}' on api '{api_id}'")]
    UnknownAuthType { api_id: String, value: String },

    #[error("incomplete ratelimit columns on key '{key_id}'")]
    PartialRatelimit { key_id: String },
}

impl From<TranslationError> for DomainError {
    fn from(err: TranslationError) -> Self {
        DomainError::storage(err.to_string())
    }
}

/// Empty strings mean "unset" for owner id and name
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl From<&Workspace> for WorkspaceRecord {
    fn from(w: &Workspace) -> Self {
        Self {
            id: w.id.clone(),
            name: w.name.clone(),
            slug: w.slug.clone(),
            tenant_id: w.tenant_id.clone(),
            internal: w.internal,
        }
    }
}

impl From<WorkspaceRecord> for Workspace {
    fn from(r: WorkspaceRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            slug: r.slug,
            tenant_id: r.tenant_id,
            internal: r.internal,
        }
    }
}

impl From<&KeyAuth> for KeyAuthRecord {
    fn from(k: &KeyAuth) -> Self {
        Self {
            id: k.id.clone(),
            workspace_id: k.workspace_id.clone(),
        }
    }
}

impl From<KeyAuthRecord> for KeyAuth {
    fn from(r: KeyAuthRecord) -> Self {
        Self {
            id: r.id,
            workspace_id: r.workspace_id,
        }
    }
}

impl From<&Api> for ApiRecord {
    fn from(a: &Api) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            workspace_id: a.workspace_id.clone(),
            auth_type: a.auth_type.as_str().to_string(),
            key_auth_id: a.key_auth_id.clone(),
            ip_whitelist: a.ip_whitelist.clone(),
        }
    }
}

impl TryFrom<ApiRecord> for Api {
    type Error = TranslationError;

    fn try_from(r: ApiRecord) -> Result<Self, Self::Error> {
        let auth_type = match AuthType::parse(&r.auth_type) {
            Some(auth_type) => auth_type,
            None => {
                return Err(TranslationError::UnknownAuthType {
                    api_id: r.id,
                    value: r.auth_type,
                });
            }
        };

        Ok(Self {
            id: r.id,
            name: r.name,
            workspace_id: r.workspace_id,
            auth_type,
            key_auth_id: r.key_auth_id,
            ip_whitelist: r.ip_whitelist,
        })
    }
}

impl TryFrom<&Key> for KeyRecord {
    type Error = TranslationError;

    fn try_from(k: &Key) -> Result<Self, Self::Error> {
        let meta = k
            .meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|source| TranslationError::MetaEncode {
                key_id: k.id.clone(),
                source,
            })?;

        let ratelimit = k.ratelimit.as_ref();

        // Keep a stored count even while the quota is disabled
        let remaining_requests = (k.remaining.enabled || k.remaining.remaining != 0)
            .then_some(k.remaining.remaining);

        Ok(Self {
            id: k.id.clone(),
            key_auth_id: k.key_auth_id.clone(),
            workspace_id: k.workspace_id.clone(),
            hash: k.hash.clone(),
            start: k.start.clone(),
            owner_id: non_empty(&k.owner_id),
            name: non_empty(&k.name),
            meta,
            created_at: k.created_at,
            expires: k.expires,
            for_workspace_id: k.for_workspace_id.clone(),
            ratelimit_type: ratelimit.map(|r| r.kind.clone()),
            ratelimit_limit: ratelimit.map(|r| r.limit),
            ratelimit_refill_rate: ratelimit.map(|r| r.refill_rate),
            ratelimit_refill_interval: ratelimit.map(|r| r.refill_interval),
            remaining_enabled: k.remaining.enabled,
            remaining_requests,
        })
    }
}

impl TryFrom<KeyRecord> for Key {
    type Error = TranslationError;

    fn try_from(r: KeyRecord) -> Result<Self, Self::Error> {
        let meta = match r.meta.as_deref() {
            Some(text) => serde_json::from_str::<Option<Meta>>(text).map_err(|source| {
                TranslationError::MetaDecode {
                    key_id: r.id.clone(),
                    source,
                }
            })?,
            None => None,
        };

        let ratelimit = match r.ratelimit_type {
            Some(kind) => match (
                r.ratelimit_limit,
                r.ratelimit_refill_rate,
                r.ratelimit_refill_interval,
            ) {
                (Some(limit), Some(refill_rate), Some(refill_interval)) => Some(Ratelimit {
                    kind,
                    limit,
                    refill_rate,
                    refill_interval,
                }),
                _ => return Err(TranslationError::PartialRatelimit { key_id: r.id }),
            },
            None => None,
        };

        Ok(Self {
            id: r.id,
            key_auth_id: r.key_auth_id,
            workspace_id: r.workspace_id,
            hash: r.hash,
            start: r.start,
            owner_id: non_empty(&r.owner_id),
            name: non_empty(&r.name),
            meta,
            created_at: r.created_at,
            expires: r.expires,
            for_workspace_id: r.for_workspace_id,
            ratelimit,
            remaining: Remaining {
                enabled: r.remaining_enabled,
                remaining: r.remaining_requests.unwrap_or(0),
            },
        })
    }
}
