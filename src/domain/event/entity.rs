//! Key event payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of key lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyEventKind {
    #[serde(rename = "key.created")]
    KeyCreated,
    #[serde(rename = "key.deleted")]
    KeyDeleted,
}

impl KeyEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyCreated => "key.created",
            Self::KeyDeleted => "key.deleted",
        }
    }
}

impl std::fmt::Display for KeyEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event published to the bus. Carries the digest, never the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    #[serde(rename = "type")]
    pub kind: KeyEventKind,
    pub key_id: String,
    pub key_hash: String,
    pub timestamp: DateTime<Utc>,
}

impl KeyEvent {
    pub fn new(kind: KeyEventKind, key_id: impl Into<String>, key_hash: impl Into<String>) -> Self {
        Self {
            kind,
            key_id: key_id.into(),
            key_hash: key_hash.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = KeyEvent::new(KeyEventKind::KeyCreated, "key_1", "digest");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "key.created");
        assert_eq!(json["keyId"], "key_1");
        assert_eq!(json["keyHash"], "digest");
    }
}
