//! Application state for shared services

use std::sync::Arc;

use crate::domain::Storage;
use crate::infrastructure::key::KeyService;

/// Long-lived handles shared by every request
#[derive(Clone)]
pub struct AppState {
    pub key_service: Arc<KeyService>,
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(key_service: KeyService) -> Self {
        let storage = Arc::clone(key_service.storage());

        Self {
            key_service: Arc::new(key_service),
            storage,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("key_service", &self.key_service)
            .finish_non_exhaustive()
    }
}
