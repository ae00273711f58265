//! Redis stream event publisher

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;

use crate::domain::{DomainError, EventPublisher, KeyEvent, KeyEventKind};

/// Configuration for the Redis event publisher
#[derive(Debug, Clone)]
pub struct RedisEventConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Stream events are appended to
    pub stream: String,
    /// Upper bound for one publish round trip
    pub publish_timeout: Duration,
}

impl Default for RedisEventConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            stream: "keyhub:key-events".to_string(),
            publish_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisEventConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = stream.into();
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }
}

/// Appends key events to a Redis stream with `XADD`
#[derive(Clone)]
pub struct RedisEventPublisher {
    connection: ConnectionManager,
    config: RedisEventConfig,
}

impl fmt::Debug for RedisEventPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisEventPublisher")
            .field("stream", &self.config.stream)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisEventPublisher {
    pub async fn connect(config: RedisEventConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::configuration(format!("Invalid Redis URL: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::publish(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn xadd(&self, event: &KeyEvent) -> redis::Cmd {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.config.stream)
            .arg("*")
            .arg("type")
            .arg(event.kind.as_str())
            .arg("keyId")
            .arg(&event.key_id)
            .arg("hash")
            .arg(&event.key_hash)
            .arg("timestamp")
            .arg(event.timestamp.timestamp_millis());
        cmd
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, kind: KeyEventKind, key_id: &str, key_hash: &str) -> Result<(), DomainError> {
        let event = KeyEvent::new(kind, key_id, key_hash);
        let cmd = self.xadd(&event);
        let mut conn = self.connection.clone();

        let entry_id: String = tokio::time::timeout(self.config.publish_timeout, cmd.query_async(&mut conn))
            .await
            .map_err(|_| {
                DomainError::publish(format!(
                    "Publishing {} timed out after {:?}",
                    kind, self.config.publish_timeout
                ))
            })?
            .map_err(|e| DomainError::publish(format!("XADD to '{}' failed: {}", self.config.stream, e)))?;

        tracing::debug!(key_id, event = %kind, entry_id = %entry_id, "Published key event");
        Ok(())
    }
}
