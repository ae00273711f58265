//! Migrate command - applies the PostgreSQL schema

use anyhow::bail;
use tracing::info;

use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::{PostgresStorage, StorageConfig};

pub async fn run() -> anyhow::Result<()> {
    let config = super::load_config()?;
    init_logging(&config.logging)?;

    let StorageConfig::Postgres(pg_config) = config.storage.storage_config()? else {
        bail!("migrate requires storage.backend = postgres");
    };

    let storage = PostgresStorage::connect(&pg_config).await?;
    let applied = storage.migrate().await?;

    info!(applied, "Migrations complete");

    Ok(())
}
