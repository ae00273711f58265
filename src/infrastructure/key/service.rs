//! Key issuance service
//!
//! Every operation runs the same root-key protocol before touching keys:
//! the bearer credential is digested and resolved to a key, which must carry
//! a workspace scope, and the target Api must live in that workspace.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use validator::Validate;

use crate::domain::{Api, DomainError, Key, KeyEventKind, Ratelimit, Storage};
use crate::infrastructure::events::KeyEventEmitter;
use crate::infrastructure::observability::{record_key_created, record_key_issuance_failure};

use super::generator::{digest, KeyGenerator};
use super::request::{CreateKeyRequest, ListKeysQuery};

/// Result of issuing a key. `key` is the only time the plaintext leaves the service.
#[derive(Clone)]
pub struct CreatedKey {
    pub key: String,
    pub key_id: String,
}

impl std::fmt::Debug for CreatedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// One page of a key listing
#[derive(Debug, Clone)]
pub struct KeyPage {
    pub api_id: String,
    pub keys: Vec<Key>,
    pub total: usize,
}

/// An authenticated root key and the workspace it may act on
#[derive(Debug, Clone)]
pub struct RootKey {
    pub key: Key,
    pub workspace_id: String,
}

/// Root-key scoped key management
#[derive(Clone)]
pub struct KeyService {
    storage: Arc<dyn Storage>,
    generator: KeyGenerator,
    events: KeyEventEmitter,
}

impl std::fmt::Debug for KeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyService")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl KeyService {
    pub fn new(storage: Arc<dyn Storage>, events: KeyEventEmitter) -> Self {
        Self {
            storage,
            generator: KeyGenerator::new(),
            events,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Resolve a bearer credential to a root key
    pub async fn authenticate_root_key(&self, credential: Option<&str>) -> Result<RootKey, DomainError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DomainError::authentication("Missing root key"))?;

        let key = match self.storage.get_key_by_hash(&digest(credential)).await {
            Ok(key) => key,
            Err(DomainError::NotFound { .. }) => {
                return Err(DomainError::authentication("Invalid root key"));
            }
            Err(e) => return Err(e),
        };

        if key.is_expired(Utc::now()) {
            return Err(DomainError::authentication("Root key expired"));
        }

        let workspace_id = key
            .root_scope()
            .map(str::to_string)
            .ok_or_else(|| DomainError::authorization("Key is not a root key"))?;

        Ok(RootKey { key, workspace_id })
    }

    /// Resolve an Api the root key may manage keys for
    async fn resolve_api(&self, root: &RootKey, api_id: &str) -> Result<(Api, String), DomainError> {
        let api = match self.storage.get_api(api_id).await {
            Ok(api) => api,
            Err(DomainError::NotFound { .. }) => return Err(DomainError::not_found("wrong apiId")),
            Err(e) => return Err(e),
        };

        if api.workspace_id != root.workspace_id {
            debug!(
                api_id,
                api_workspace_id = %api.workspace_id,
                root_workspace_id = %root.workspace_id,
                "Root key scope does not cover api"
            );
            return Err(DomainError::authorization("access to workspace denied"));
        }

        let key_auth_id = api
            .issuable_key_auth_id()
            .map(str::to_string)
            .ok_or_else(|| DomainError::configuration("api is not set up for key authentication"))?;

        Ok((api, key_auth_id))
    }

    /// Issue a key for an Api in the root key's workspace
    #[tracing::instrument(name = "create_key", skip_all, fields(api_id = %request.api_id))]
    pub async fn create_key(
        &self,
        credential: Option<&str>,
        request: CreateKeyRequest,
    ) -> Result<CreatedKey, DomainError> {
        let result = self.issue(credential, request).await;

        match &result {
            Ok(_) => record_key_created(),
            Err(e) => record_key_issuance_failure(e.kind()),
        }

        result
    }

    async fn issue(&self, credential: Option<&str>, request: CreateKeyRequest) -> Result<CreatedKey, DomainError> {
        request.validate()?;
        let expires = parse_expiration(request.expires, Utc::now())?;

        if request.for_workspace_id.is_some() {
            debug!("Ignoring forWorkspaceId from request body");
        }

        let root = self.authenticate_root_key(credential).await?;
        let (api, key_auth_id) = self.resolve_api(&root, &request.api_id).await?;

        let generated = self
            .generator
            .generate(request.prefix.as_deref(), request.byte_length)?;

        let mut key = Key::new(key_auth_id, root.workspace_id.clone(), generated.hash, generated.start);
        if let Some(owner_id) = request.owner_id {
            key = key.with_owner_id(owner_id);
        }
        if let Some(name) = request.name {
            key = key.with_name(name);
        }
        if let Some(meta) = request.meta {
            key = key.with_meta(meta);
        }
        if let Some(expires) = expires {
            key = key.with_expiration(expires);
        }
        if let Some(ratelimit) = request.ratelimit {
            key = key.with_ratelimit(Ratelimit {
                kind: ratelimit.kind,
                limit: ratelimit.limit,
                refill_rate: ratelimit.refill_rate,
                refill_interval: ratelimit.refill_interval,
            });
        }
        if let Some(remaining) = request.remaining.filter(|r| *r > 0) {
            key = key.with_remaining(remaining);
        }

        let key_id = key.id.clone();
        let key_hash = key.hash.clone();

        self.storage.create_key(key).await?;

        info!(
            key_id = %key_id,
            api_id = %api.id,
            workspace_id = %root.workspace_id,
            "Key created"
        );

        self.events.emit(KeyEventKind::KeyCreated, &key_id, &key_hash);

        Ok(CreatedKey {
            key: generated.key,
            key_id,
        })
    }

    /// List the keys of an Api in the root key's workspace
    #[tracing::instrument(name = "list_keys", skip(self, credential, query))]
    pub async fn list_keys(
        &self,
        credential: Option<&str>,
        api_id: &str,
        query: ListKeysQuery,
    ) -> Result<KeyPage, DomainError> {
        query.validate()?;

        let root = self.authenticate_root_key(credential).await?;
        let (api, key_auth_id) = self.resolve_api(&root, api_id).await?;

        let keys = self
            .storage
            .list_keys_by_key_auth_id(&key_auth_id, query.limit(), query.offset(), query.owner_id.clone())
            .await?;
        let total = self.storage.count_keys(&key_auth_id).await?;

        Ok(KeyPage {
            api_id: api.id,
            keys,
            total,
        })
    }

    /// Delete a key owned by an Api in the root key's workspace
    #[tracing::instrument(name = "delete_key", skip(self, credential))]
    pub async fn delete_key(&self, credential: Option<&str>, key_id: &str) -> Result<(), DomainError> {
        let root = self.authenticate_root_key(credential).await?;

        let key = match self.storage.get_key_by_id(key_id).await {
            Ok(key) => key,
            Err(DomainError::NotFound { .. }) => return Err(DomainError::not_found("wrong keyId")),
            Err(e) => return Err(e),
        };

        let api = match self.storage.get_api_by_key_auth_id(&key.key_auth_id).await {
            Ok(api) => api,
            Err(DomainError::NotFound { .. }) => return Err(DomainError::not_found("wrong keyId")),
            Err(e) => return Err(e),
        };

        // Keys outside the scope are indistinguishable from missing ones
        if api.workspace_id != root.workspace_id {
            return Err(DomainError::not_found("wrong keyId"));
        }

        self.storage.delete_key(&key.id).await?;
        info!(key_id = %key.id, workspace_id = %root.workspace_id, "Key deleted");

        self.events.emit(KeyEventKind::KeyDeleted, &key.id, &key.hash);
        Ok(())
    }
}

/// `expires` is Unix milliseconds and must lie strictly after `now`
fn parse_expiration(expires: Option<i64>, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, DomainError> {
    let Some(ms) = expires else {
        return Ok(None);
    };

    let expires = DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| DomainError::validation("expires is out of range"))?;

    if expires <= now {
        return Err(DomainError::validation("expires must be in the future"));
    }

    Ok(Some(expires))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::MockStorage;
    use crate::domain::Remaining;
    use crate::infrastructure::events::InMemoryEventPublisher;
    use crate::infrastructure::storage::InMemoryStorage;

    const ROOT_SECRET: &str = "root_secretvalue";

    fn root_key(scope: &str) -> Key {
        Key::new("ks_root", "ws_internal", digest(ROOT_SECRET), "root_secr").for_workspace(scope)
    }

    async fn seeded_storage() -> Arc<InMemoryStorage> {
        let storage = Arc::new(InMemoryStorage::new());
        storage.create_key(root_key("ws_1")).await.unwrap();

        let mut api = Api::with_key_auth("payments", "ws_1", "ks_1");
        api.id = "api_1".to_string();
        storage.create_api(api).await.unwrap();

        let mut foreign = Api::with_key_auth("other", "ws_2", "ks_2");
        foreign.id = "api_2".to_string();
        storage.create_api(foreign).await.unwrap();

        let mut jwt = Api::with_jwt_auth("jwt", "ws_1");
        jwt.id = "api_jwt".to_string();
        storage.create_api(jwt).await.unwrap();

        storage
    }

    fn service(storage: Arc<InMemoryStorage>) -> KeyService {
        KeyService::new(storage, KeyEventEmitter::disabled())
    }

    #[tokio::test]
    async fn test_create_key_persists_scoped_key() {
        let storage = seeded_storage().await;
        let service = service(storage.clone());

        let mut request = CreateKeyRequest::new("api_1");
        request.prefix = Some("pk".to_string());
        request.owner_id = Some("user_1".to_string());
        request.remaining = Some(10);

        let created = service.create_key(Some(ROOT_SECRET), request).await.unwrap();
        assert!(created.key.starts_with("pk_"));

        let stored = storage.get_key_by_hash(&digest(&created.key)).await.unwrap();
        assert_eq!(stored.id, created.key_id);
        assert_eq!(stored.workspace_id, "ws_1");
        assert_eq!(stored.key_auth_id, "ks_1");
        assert_eq!(stored.owner_id.as_deref(), Some("user_1"));
        assert_eq!(stored.remaining, Remaining::limited(10));
        assert!(!stored.is_root_key());
    }

    #[tokio::test]
    async fn test_non_positive_remaining_disables_quota() {
        let storage = seeded_storage().await;
        let service = service(storage.clone());

        let mut request = CreateKeyRequest::new("api_1");
        request.remaining = Some(0);

        let created = service.create_key(Some(ROOT_SECRET), request).await.unwrap();
        let stored = storage.get_key_by_id(&created.key_id).await.unwrap();
        assert!(!stored.remaining.enabled);
    }

    #[tokio::test]
    async fn test_create_key_emits_event() {
        let storage = seeded_storage().await;
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let service = KeyService::new(storage, KeyEventEmitter::new(Some(publisher.clone())));

        let created = service
            .create_key(Some(ROOT_SECRET), CreateKeyRequest::new("api_1"))
            .await
            .unwrap();

        // Emission is detached; give it a moment to land
        for _ in 0..50 {
            if !publisher.events().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, KeyEventKind::KeyCreated);
        assert_eq!(events[0].key_id, created.key_id);
        assert_eq!(events[0].key_hash, digest(&created.key));
    }

    #[tokio::test]
    async fn test_missing_or_unknown_credential_is_unauthenticated() {
        let service = service(seeded_storage().await);

        let missing = service.create_key(None, CreateKeyRequest::new("api_1")).await;
        assert!(matches!(missing, Err(DomainError::Authentication { .. })));

        let unknown = service
            .create_key(Some("nope"), CreateKeyRequest::new("api_1"))
            .await;
        assert!(matches!(unknown, Err(DomainError::Authentication { .. })));
    }

    #[tokio::test]
    async fn test_ordinary_key_is_not_a_root_key() {
        let storage = seeded_storage().await;
        storage
            .create_key(Key::new("ks_1", "ws_1", digest("plain_key"), "plain_key"))
            .await
            .unwrap();

        let result = service(storage)
            .create_key(Some("plain_key"), CreateKeyRequest::new("api_1"))
            .await;
        assert!(matches!(result, Err(DomainError::Authorization { .. })));
    }

    #[tokio::test]
    async fn test_api_outside_scope_is_denied() {
        let result = service(seeded_storage().await)
            .create_key(Some(ROOT_SECRET), CreateKeyRequest::new("api_2"))
            .await;
        assert!(matches!(result, Err(DomainError::Authorization { .. })));
    }

    #[tokio::test]
    async fn test_unknown_api_and_jwt_api() {
        let service = service(seeded_storage().await);

        let unknown = service
            .create_key(Some(ROOT_SECRET), CreateKeyRequest::new("api_x"))
            .await;
        assert!(matches!(unknown, Err(DomainError::NotFound { .. })));

        let jwt = service
            .create_key(Some(ROOT_SECRET), CreateKeyRequest::new("api_jwt"))
            .await;
        assert!(matches!(jwt, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_request_scope_is_ignored() {
        let storage = seeded_storage().await;
        let service = service(storage.clone());

        let mut request = CreateKeyRequest::new("api_1");
        request.for_workspace_id = Some("ws_2".to_string());

        let created = service.create_key(Some(ROOT_SECRET), request).await.unwrap();
        let stored = storage.get_key_by_id(&created.key_id).await.unwrap();
        assert_eq!(stored.workspace_id, "ws_1");
        assert!(stored.for_workspace_id.is_none());
    }

    #[tokio::test]
    async fn test_past_expiration_never_reaches_storage() {
        let mut storage = MockStorage::new();
        storage.expect_create_key().times(0);
        storage.expect_get_key_by_hash().times(0);

        let service = KeyService::new(Arc::new(storage), KeyEventEmitter::disabled());

        let mut request = CreateKeyRequest::new("api_1");
        request.expires = Some(Utc::now().timestamp_millis() - 1_000);

        let result = service.create_key(Some(ROOT_SECRET), request).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_a_storage_error() {
        let mut storage = MockStorage::new();
        storage
            .expect_get_key_by_hash()
            .returning(|_| Ok(root_key("ws_1")));
        storage.expect_get_api().returning(|id| {
            let mut api = Api::with_key_auth("payments", "ws_1", "ks_1");
            api.id = id.to_string();
            Ok(api)
        });
        storage
            .expect_create_key()
            .times(1)
            .returning(|_| Err(DomainError::storage("connection reset")));

        let service = KeyService::new(Arc::new(storage), KeyEventEmitter::disabled());
        let result = service
            .create_key(Some(ROOT_SECRET), CreateKeyRequest::new("api_1"))
            .await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_list_keys_is_scoped_and_paged() {
        let storage = seeded_storage().await;
        let service = service(storage.clone());

        for owner in ["a", "b", "a"] {
            let mut request = CreateKeyRequest::new("api_1");
            request.owner_id = Some(owner.to_string());
            service.create_key(Some(ROOT_SECRET), request).await.unwrap();
        }

        let page = service
            .list_keys(Some(ROOT_SECRET), "api_1", ListKeysQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.keys.len(), 3);

        let owned = service
            .list_keys(
                Some(ROOT_SECRET),
                "api_1",
                ListKeysQuery {
                    owner_id: Some("a".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(owned.keys.len(), 2);

        let foreign = service
            .list_keys(Some(ROOT_SECRET), "api_2", ListKeysQuery::default())
            .await;
        assert!(matches!(foreign, Err(DomainError::Authorization { .. })));
    }

    #[tokio::test]
    async fn test_delete_key() {
        let storage = seeded_storage().await;
        let service = service(storage.clone());

        let created = service
            .create_key(Some(ROOT_SECRET), CreateKeyRequest::new("api_1"))
            .await
            .unwrap();

        service.delete_key(Some(ROOT_SECRET), &created.key_id).await.unwrap();
        assert!(matches!(
            storage.get_key_by_id(&created.key_id).await,
            Err(DomainError::NotFound { .. })
        ));

        let again = service.delete_key(Some(ROOT_SECRET), &created.key_id).await;
        assert!(matches!(again, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_key_outside_scope_looks_missing() {
        let storage = seeded_storage().await;
        let foreign = Key::new("ks_2", "ws_2", digest("foreign_key"), "foreign_k");
        storage.create_key(foreign.clone()).await.unwrap();

        let result = service(storage.clone())
            .delete_key(Some(ROOT_SECRET), &foreign.id)
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert!(storage.get_key_by_id(&foreign.id).await.is_ok());
    }

    #[test]
    fn test_parse_expiration() {
        let now = Utc::now();
        let ms = now.timestamp_millis();

        assert_eq!(parse_expiration(None, now).unwrap(), None);
        assert!(parse_expiration(Some(ms + 60_000), now).unwrap().is_some());
        assert!(parse_expiration(Some(ms - 1), now).is_err());
        assert!(parse_expiration(Some(i64::MAX), now).is_err());
    }
}
