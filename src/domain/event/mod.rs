//! Key lifecycle events
//!
//! Events are published best-effort to an optional downstream bus.

mod entity;
mod publisher;

pub use entity::{KeyEvent, KeyEventKind};
#[cfg(test)]
pub use publisher::MockEventPublisher;
pub use publisher::EventPublisher;
