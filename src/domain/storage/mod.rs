//! Storage domain - persistence contract for the key entities

mod gateway;

#[cfg(test)]
pub use gateway::MockStorage;
pub use gateway::{RemainingUsage, Storage};
