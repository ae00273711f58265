//! In-memory event publisher

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{DomainError, EventPublisher, KeyEvent, KeyEventKind};

/// Records published events; used for local runs and tests
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    events: RwLock<Vec<KeyEvent>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far
    pub fn events(&self) -> Vec<KeyEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, kind: KeyEventKind, key_id: &str, key_hash: &str) -> Result<(), DomainError> {
        self.events
            .write()
            .map_err(|e| DomainError::publish(format!("Failed to acquire write lock: {}", e)))?
            .push(KeyEvent::new(kind, key_id, key_hash));
        Ok(())
    }
}
