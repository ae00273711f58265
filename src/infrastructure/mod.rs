//! Infrastructure layer - storage backends, key issuance and event delivery

pub mod events;
pub mod key;
pub mod logging;
pub mod observability;
pub mod storage;
