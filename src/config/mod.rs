//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EventSettings, LogFormat, LoggingConfig, PostgresSettings, ServerConfig,
    StorageSettings,
};
