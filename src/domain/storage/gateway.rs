//! Storage gateway contract
//!
//! Every lookup reports absence as `DomainError::NotFound` rather than an
//! empty result, so callers must handle it explicitly.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::api::Api;
use crate::domain::key::Key;
use crate::domain::key_auth::KeyAuth;
use crate::domain::workspace::Workspace;
use crate::domain::DomainError;

/// Outcome of consuming one use from a key's quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingUsage {
    /// The key has no quota configured; nothing was decremented
    Unlimited,
    /// One use was consumed; this many remain
    Remaining(i64),
    /// The quota was already at zero; nothing was decremented
    Exhausted,
}

impl RemainingUsage {
    /// Whether the use was granted
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }
}

/// Persistence contract for workspaces, Apis, key namespaces and keys
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_workspace(&self, workspace: Workspace) -> Result<(), DomainError>;

    async fn get_workspace(&self, workspace_id: &str) -> Result<Workspace, DomainError>;

    async fn create_api(&self, api: Api) -> Result<(), DomainError>;

    async fn get_api(&self, api_id: &str) -> Result<Api, DomainError>;

    async fn get_api_by_key_auth_id(&self, key_auth_id: &str) -> Result<Api, DomainError>;

    async fn create_key_auth(&self, key_auth: KeyAuth) -> Result<(), DomainError>;

    async fn get_key_auth(&self, key_auth_id: &str) -> Result<KeyAuth, DomainError>;

    /// Persist a new key; a duplicate id or hash is a conflict
    async fn create_key(&self, key: Key) -> Result<(), DomainError>;

    async fn update_key(&self, key: Key) -> Result<(), DomainError>;

    async fn delete_key(&self, key_id: &str) -> Result<(), DomainError>;

    async fn get_key_by_hash(&self, hash: &str) -> Result<Key, DomainError>;

    async fn get_key_by_id(&self, key_id: &str) -> Result<Key, DomainError>;

    async fn count_keys(&self, key_auth_id: &str) -> Result<usize, DomainError>;

    /// List keys of a namespace ordered by creation time, optionally only those of one owner
    async fn list_keys_by_key_auth_id(
        &self,
        key_auth_id: &str,
        limit: usize,
        offset: usize,
        owner_id: Option<String>,
    ) -> Result<Vec<Key>, DomainError>;

    /// Atomically consume one use of the key's quota.
    ///
    /// Concurrent callers each observe a distinct post-decrement value and the
    /// stored count never drops below zero.
    async fn decrement_remaining_key_usage(&self, key_id: &str) -> Result<RemainingUsage, DomainError>;

    /// Cheap round trip used by readiness probes
    async fn ping(&self) -> Result<(), DomainError>;
}
