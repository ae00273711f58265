//! Storage factory for runtime backend selection

use std::sync::Arc;

use crate::domain::storage::Storage;
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    InMemory,
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Builds the storage gateway shared by every request
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the configured backend; Postgres schemas are migrated on start-up
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn Storage>, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryStorage::new())),
            StorageConfig::Postgres(pg_config) => {
                let storage = PostgresStorage::connect(pg_config).await?;
                let applied = storage.migrate().await?;
                tracing::info!(applied, "PostgreSQL storage ready");
                Ok(Arc::new(storage))
            }
        }
    }
}
