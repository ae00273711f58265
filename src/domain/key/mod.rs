//! Key domain
//!
//! Keys are the issued credentials. A key with `for_workspace_id` set is a
//! root key and may mint keys scoped to that one workspace.

mod entity;

pub use entity::{Key, Meta, Ratelimit, Remaining};
