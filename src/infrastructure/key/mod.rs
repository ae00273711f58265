//! Key generation and root-key scoped key management

mod generator;
mod request;
mod service;

pub use generator::{digest, GeneratedKey, KeyGenerator, PREFIX_DELIMITER};
pub use request::{CreateKeyRequest, ListKeysQuery, RatelimitRequest, DEFAULT_BYTE_LENGTH, MAX_PAGE_SIZE};
pub use service::{CreatedKey, KeyPage, KeyService, RootKey};
