//! Detached, best-effort event emission

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::{EventPublisher, KeyEventKind};
use crate::infrastructure::observability::record_event_publish_failure;

/// Fire-and-forget wrapper around an optional event bus
///
/// Publication runs on its own task; its outcome never reaches the caller
/// and failures are only logged.
#[derive(Clone, Default)]
pub struct KeyEventEmitter {
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl std::fmt::Debug for KeyEventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEventEmitter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl KeyEventEmitter {
    pub fn new(publisher: Option<Arc<dyn EventPublisher>>) -> Self {
        Self { publisher }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.publisher.is_some()
    }

    /// Spawn publication of one event. Returns the task handle when a bus is configured.
    pub fn emit(&self, kind: KeyEventKind, key_id: &str, key_hash: &str) -> Option<JoinHandle<()>> {
        let publisher = Arc::clone(self.publisher.as_ref()?);
        let key_id = key_id.to_string();
        let key_hash = key_hash.to_string();

        Some(tokio::spawn(async move {
            if let Err(e) = publisher.publish(kind, &key_id, &key_hash).await {
                record_event_publish_failure();
                tracing::warn!(key_id = %key_id, event = %kind, error = %e, "Failed to publish key event");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::MockEventPublisher;
    use crate::domain::DomainError;
    use crate::infrastructure::events::InMemoryEventPublisher;

    #[tokio::test]
    async fn test_disabled_emitter_spawns_nothing() {
        let emitter = KeyEventEmitter::disabled();
        assert!(!emitter.is_enabled());
        assert!(emitter.emit(KeyEventKind::KeyCreated, "key_1", "h1").is_none());
    }

    #[tokio::test]
    async fn test_emits_to_publisher() {
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let emitter = KeyEventEmitter::new(Some(publisher.clone()));

        emitter
            .emit(KeyEventKind::KeyCreated, "key_1", "h1")
            .unwrap()
            .await
            .unwrap();

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key_id, "key_1");
        assert_eq!(events[0].key_hash, "h1");
    }

    #[tokio::test]
    async fn test_publish_failure_is_absorbed() {
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_, _, _| Err(DomainError::publish("bus down")));

        let emitter = KeyEventEmitter::new(Some(Arc::new(publisher)));
        let handle = emitter.emit(KeyEventKind::KeyDeleted, "key_1", "h1").unwrap();

        // The task completes normally even though publishing failed
        handle.await.unwrap();
    }
}
