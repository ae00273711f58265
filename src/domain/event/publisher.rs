use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::entity::KeyEventKind;
use crate::domain::DomainError;

/// Downstream event bus. Delivery guarantees belong to the bus, not to callers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event; failures surface as `DomainError::Publish`
    async fn publish(&self, kind: KeyEventKind, key_id: &str, key_hash: &str) -> Result<(), DomainError>;
}
