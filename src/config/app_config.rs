use std::time::Duration;

use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::events::RedisEventConfig;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub events: EventSettings,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests running longer are cancelled
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    pub postgres: PostgresSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    pub enabled: bool,
    pub redis_url: String,
    pub stream: String,
    pub publish_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            postgres: PostgresSettings::default(),
        }
    }
}

impl Default for PostgresSettings {
    fn default() -> Self {
        let defaults = PostgresConfig::default();
        Self {
            url: defaults.url,
            max_connections: defaults.max_connections,
            min_connections: defaults.min_connections,
        }
    }
}

impl Default for EventSettings {
    fn default() -> Self {
        let defaults = RedisEventConfig::default();
        Self {
            enabled: false,
            redis_url: defaults.url,
            stream: defaults.stream,
            publish_timeout_ms: defaults.publish_timeout.as_millis() as u64,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl StorageSettings {
    /// Resolve the configured backend
    pub fn storage_config(&self) -> Result<StorageConfig, DomainError> {
        match StorageType::from_str(&self.backend) {
            Some(StorageType::InMemory) => Ok(StorageConfig::InMemory),
            Some(StorageType::Postgres) => Ok(StorageConfig::Postgres(
                PostgresConfig::new(&self.postgres.url)
                    .with_max_connections(self.postgres.max_connections)
                    .with_min_connections(self.postgres.min_connections),
            )),
            None => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                self.backend
            ))),
        }
    }
}

impl EventSettings {
    /// Redis settings when the event bus is enabled
    pub fn redis_config(&self) -> Option<RedisEventConfig> {
        self.enabled.then(|| {
            RedisEventConfig::new(&self.redis_url)
                .with_stream(&self.stream)
                .with_publish_timeout(Duration::from_millis(self.publish_timeout_ms))
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
