//! Workspace entity

use serde::{Deserialize, Serialize};

use crate::domain::id::{new_id, prefix};

/// Tenant-level entity owning Apis and Keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// External billing/identity reference
    pub tenant_id: String,
    /// Platform-owned workspace (holds root keys)
    pub internal: bool,
}

impl Workspace {
    /// Create a new workspace with a generated identifier
    pub fn new(name: impl Into<String>, slug: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            id: new_id(prefix::WORKSPACE),
            name: name.into(),
            slug: slug.into(),
            tenant_id: tenant_id.into(),
            internal: false,
        }
    }

    /// Mark the workspace as platform-owned
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }
}
