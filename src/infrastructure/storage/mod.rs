//! Storage backends and the entity/record translator

mod conversion;
mod factory;
mod in_memory;
pub mod migrations;
mod postgres;
mod records;

pub use conversion::TranslationError;
pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryStorage;
pub use migrations::{run_storage_migrations, Migration, PostgresMigrator};
pub use postgres::{PostgresConfig, PostgresStorage};
pub use records::{ApiRecord, KeyAuthRecord, KeyRecord, WorkspaceRecord};
