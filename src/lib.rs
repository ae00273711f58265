//! Keyhub API
//!
//! Root-key scoped API key management:
//! - Issuing keys for an Api on behalf of a workspace
//! - Listing and revoking issued keys
//! - Publishing key lifecycle events to Redis streams
//! - In-memory or PostgreSQL storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{EventPublisher, Storage};
use infrastructure::events::{KeyEventEmitter, RedisEventPublisher};
use infrastructure::key::KeyService;
use infrastructure::storage::StorageFactory;
use tracing::info;

/// Create the application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage.storage_config()?;
    info!(backend = ?storage_config.storage_type(), "Initializing storage");

    let storage = StorageFactory::create(&storage_config).await?;
    let events = create_event_emitter(config).await?;

    Ok(create_app_state_with(storage, events))
}

/// Assemble the application state from already-built collaborators
pub fn create_app_state_with(storage: Arc<dyn Storage>, events: KeyEventEmitter) -> AppState {
    AppState::new(KeyService::new(storage, events))
}

async fn create_event_emitter(config: &AppConfig) -> anyhow::Result<KeyEventEmitter> {
    let Some(redis_config) = config.events.redis_config() else {
        info!("Key event publishing disabled");
        return Ok(KeyEventEmitter::disabled());
    };

    info!(stream = %redis_config.stream, "Connecting key event publisher to Redis");
    let publisher: Arc<dyn EventPublisher> = Arc::new(RedisEventPublisher::connect(redis_config).await?);

    Ok(KeyEventEmitter::new(Some(publisher)))
}
