use serde::{Deserialize, Serialize};

use crate::domain::id::{new_id, prefix};

/// Namespace grouping keys for one Api within one workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAuth {
    pub id: String,
    pub workspace_id: String,
}

impl KeyAuth {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            id: new_id(prefix::KEY_AUTH),
            workspace_id: workspace_id.into(),
        }
    }
}
