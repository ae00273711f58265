//! In-memory storage implementation

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::storage::{RemainingUsage, Storage};
use crate::domain::{Api, DomainError, Key, KeyAuth, Workspace};

use super::records::{ApiRecord, KeyAuthRecord, KeyRecord, WorkspaceRecord};

#[derive(Debug, Default)]
struct Tables {
    workspaces: HashMap<String, WorkspaceRecord>,
    apis: HashMap<String, ApiRecord>,
    key_auth: HashMap<String, KeyAuthRecord>,
    keys: HashMap<String, KeyRecord>,
    /// hash -> key id
    key_hashes: HashMap<String, String>,
}

/// Thread-safe in-memory storage
///
/// Rows are kept in their persisted record shape and decoded on every read,
/// so it behaves like the database backend. Data is lost when the process
/// terminates.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DomainError> {
        self.tables
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DomainError> {
        self.tables
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Stores a raw key row, bypassing encoding
    #[cfg(test)]
    pub(crate) fn insert_key_record(&self, record: KeyRecord) {
        let mut tables = self.tables.write().unwrap();
        tables.key_hashes.insert(record.hash.clone(), record.id.clone());
        tables.keys.insert(record.id.clone(), record);
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_workspace(&self, workspace: Workspace) -> Result<(), DomainError> {
        let mut tables = self.write()?;

        if tables.workspaces.contains_key(&workspace.id) {
            return Err(DomainError::conflict(format!(
                "Workspace '{}' already exists",
                workspace.id
            )));
        }

        tables
            .workspaces
            .insert(workspace.id.clone(), WorkspaceRecord::from(&workspace));
        Ok(())
    }

    async fn get_workspace(&self, workspace_id: &str) -> Result<Workspace, DomainError> {
        self.read()?
            .workspaces
            .get(workspace_id)
            .cloned()
            .map(Workspace::from)
            .ok_or_else(|| DomainError::not_found(format!("Workspace '{}' not found", workspace_id)))
    }

    async fn create_api(&self, api: Api) -> Result<(), DomainError> {
        let mut tables = self.write()?;

        if tables.apis.contains_key(&api.id) {
            return Err(DomainError::conflict(format!("Api '{}' already exists", api.id)));
        }

        tables.apis.insert(api.id.clone(), ApiRecord::from(&api));
        Ok(())
    }

    async fn get_api(&self, api_id: &str) -> Result<Api, DomainError> {
        let record = self
            .read()?
            .apis
            .get(api_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Api '{}' not found", api_id)))?;

        Ok(Api::try_from(record)?)
    }

    async fn get_api_by_key_auth_id(&self, key_auth_id: &str) -> Result<Api, DomainError> {
        let record = self
            .read()?
            .apis
            .values()
            .find(|api| api.key_auth_id.as_deref() == Some(key_auth_id))
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(format!("No Api uses key auth '{}'", key_auth_id))
            })?;

        Ok(Api::try_from(record)?)
    }

    async fn create_key_auth(&self, key_auth: KeyAuth) -> Result<(), DomainError> {
        let mut tables = self.write()?;

        if tables.key_auth.contains_key(&key_auth.id) {
            return Err(DomainError::conflict(format!(
                "Key auth '{}' already exists",
                key_auth.id
            )));
        }

        tables
            .key_auth
            .insert(key_auth.id.clone(), KeyAuthRecord::from(&key_auth));
        Ok(())
    }

    async fn get_key_auth(&self, key_auth_id: &str) -> Result<KeyAuth, DomainError> {
        self.read()?
            .key_auth
            .get(key_auth_id)
            .cloned()
            .map(KeyAuth::from)
            .ok_or_else(|| DomainError::not_found(format!("Key auth '{}' not found", key_auth_id)))
    }

    async fn create_key(&self, key: Key) -> Result<(), DomainError> {
        let record = KeyRecord::try_from(&key)?;
        let mut tables = self.write()?;

        if tables.keys.contains_key(&record.id) {
            return Err(DomainError::conflict(format!("Key '{}' already exists", record.id)));
        }
        if tables.key_hashes.contains_key(&record.hash) {
            return Err(DomainError::conflict("Key hash already exists"));
        }

        tables.key_hashes.insert(record.hash.clone(), record.id.clone());
        tables.keys.insert(record.id.clone(), record);
        Ok(())
    }

    async fn update_key(&self, key: Key) -> Result<(), DomainError> {
        let record = KeyRecord::try_from(&key)?;
        let mut tables = self.write()?;

        let previous_hash = match tables.keys.get(&record.id) {
            Some(existing) => existing.hash.clone(),
            None => {
                return Err(DomainError::not_found(format!("Key '{}' not found", record.id)));
            }
        };

        if previous_hash != record.hash {
            if tables.key_hashes.contains_key(&record.hash) {
                return Err(DomainError::conflict("Key hash already exists"));
            }
            tables.key_hashes.remove(&previous_hash);
            tables.key_hashes.insert(record.hash.clone(), record.id.clone());
        }

        tables.keys.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete_key(&self, key_id: &str) -> Result<(), DomainError> {
        let mut tables = self.write()?;

        let record = tables
            .keys
            .remove(key_id)
            .ok_or_else(|| DomainError::not_found(format!("Key '{}' not found", key_id)))?;
        tables.key_hashes.remove(&record.hash);
        Ok(())
    }

    async fn get_key_by_hash(&self, hash: &str) -> Result<Key, DomainError> {
        let record = {
            let tables = self.read()?;
            tables
                .key_hashes
                .get(hash)
                .and_then(|id| tables.keys.get(id))
                .cloned()
                .ok_or_else(|| DomainError::not_found("Key not found"))?
        };

        Ok(Key::try_from(record)?)
    }

    async fn get_key_by_id(&self, key_id: &str) -> Result<Key, DomainError> {
        let record = self
            .read()?
            .keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Key '{}' not found", key_id)))?;

        Ok(Key::try_from(record)?)
    }

    async fn count_keys(&self, key_auth_id: &str) -> Result<usize, DomainError> {
        Ok(self
            .read()?
            .keys
            .values()
            .filter(|key| key.key_auth_id == key_auth_id)
            .count())
    }

    async fn list_keys_by_key_auth_id(
        &self,
        key_auth_id: &str,
        limit: usize,
        offset: usize,
        owner_id: Option<String>,
    ) -> Result<Vec<Key>, DomainError> {
        let mut records: Vec<KeyRecord> = self
            .read()?
            .keys
            .values()
            .filter(|key| key.key_auth_id == key_auth_id)
            .filter(|key| owner_id.is_none() || key.owner_id == owner_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        records
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|record| Key::try_from(record).map_err(DomainError::from))
            .collect()
    }

    async fn decrement_remaining_key_usage(&self, key_id: &str) -> Result<RemainingUsage, DomainError> {
        let mut tables = self.write()?;

        let record = tables
            .keys
            .get_mut(key_id)
            .ok_or_else(|| DomainError::not_found(format!("Key '{}' not found", key_id)))?;

        if !record.remaining_enabled {
            return Ok(RemainingUsage::Unlimited);
        }

        match record.remaining_requests {
            Some(remaining) if remaining > 0 => {
                record.remaining_requests = Some(remaining - 1);
                Ok(RemainingUsage::Remaining(remaining - 1))
            }
            _ => Ok(RemainingUsage::Exhausted),
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.read().map(|_| ())
    }
}
