//! Domain layer - Core entities and collaborator contracts

pub mod api;
pub mod error;
pub mod event;
pub mod id;
pub mod key;
pub mod key_auth;
pub mod storage;
pub mod workspace;

pub use api::{Api, AuthType};
pub use error::DomainError;
pub use event::{EventPublisher, KeyEvent, KeyEventKind};
pub use key::{Key, Meta, Ratelimit, Remaining};
pub use key_auth::KeyAuth;
pub use storage::{RemainingUsage, Storage};
pub use workspace::Workspace;
