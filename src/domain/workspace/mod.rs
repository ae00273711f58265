//! Workspace domain
//!
//! Workspaces are the tenant boundary: they own Apis, KeyAuth namespaces and keys.

mod entity;

pub use entity::Workspace;
