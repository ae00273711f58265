//! Prefixed entity identifiers

use uuid::Uuid;

/// Identifier prefixes, one per entity kind
pub mod prefix {
    pub const WORKSPACE: &str = "ws";
    pub const API: &str = "api";
    pub const KEY_AUTH: &str = "ks";
    pub const KEY: &str = "key";
}

/// Generate a fresh identifier such as `key_3f2a...`
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_has_prefix() {
        let id = new_id(prefix::KEY);
        assert!(id.starts_with("key_"));
        assert_eq!(id.len(), "key_".len() + 32);
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(prefix::API), new_id(prefix::API));
    }
}
