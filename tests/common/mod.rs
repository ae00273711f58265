//! Test application setup utilities
//!
//! Builds the router against in-memory storage seeded with a bootstrapped
//! root key, plus an Api owned by a second workspace.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, http::StatusCode, Router};
use serde_json::Value;
use tower::ServiceExt;

use keyhub::api::create_router;
use keyhub::cli::bootstrap::{provision, BootstrapArgs};
use keyhub::domain::{Api, EventPublisher, Key, KeyAuth, Storage, Workspace};
use keyhub::infrastructure::events::{InMemoryEventPublisher, KeyEventEmitter};
use keyhub::infrastructure::key::digest;
use keyhub::infrastructure::storage::InMemoryStorage;

/// Plaintext of a stored key that carries no workspace scope
pub const PLAIN_KEY: &str = "plain_notaroot";

pub struct TestApp {
    pub router: Router,
    pub storage: Arc<InMemoryStorage>,
    pub events: Arc<InMemoryEventPublisher>,
    pub root_key: String,
    pub workspace_id: String,
    pub api_id: String,
    pub foreign_api_id: String,
    pub jwt_api_id: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        let provisioned = provision(storage.as_ref(), &BootstrapArgs::default())
            .await
            .expect("Failed to bootstrap");

        let other = Workspace::new("Other", "other", "tenant_other");
        let other_key_auth = KeyAuth::new(&other.id);
        let foreign = Api::with_key_auth("foreign", &other.id, &other_key_auth.id);
        let jwt = Api::with_jwt_auth("jwt", &provisioned.workspace_id);
        let plain = Key::new(&other_key_auth.id, &other.id, digest(PLAIN_KEY), "plain_nota");

        let foreign_api_id = foreign.id.clone();
        let jwt_api_id = jwt.id.clone();

        storage.create_workspace(other).await.unwrap();
        storage.create_key_auth(other_key_auth).await.unwrap();
        storage.create_api(foreign).await.unwrap();
        storage.create_api(jwt).await.unwrap();
        storage.create_key(plain).await.unwrap();

        let events = Arc::new(InMemoryEventPublisher::new());
        let publisher: Arc<dyn EventPublisher> = events.clone();
        let emitter = KeyEventEmitter::new(Some(publisher));
        let state = keyhub::create_app_state_with(storage.clone(), emitter);

        Self {
            router: create_router(state, Duration::from_secs(5)),
            storage,
            events,
            root_key: provisioned.root_key,
            workspace_id: provisioned.workspace_id,
            api_id: provisioned.api_id,
            foreign_api_id,
            jwt_api_id,
        }
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        self.request(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("DELETE").uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        self.request(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            body: body.to_vec(),
        }
    }

    /// Issue a key through the API and return `(key, keyId)`
    pub async fn issue(&self, body: Value) -> (String, String) {
        let response = self
            .post_json("/v1/keys", Some(&self.root_key), &body.to_string())
            .await;
        response.assert_status(StatusCode::OK);

        let json = response.json();
        (
            json["key"].as_str().unwrap().to_string(),
            json["keyId"].as_str().unwrap().to_string(),
        )
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert a `{code, error}` envelope with the given status
    pub fn assert_error(&self, expected: StatusCode, code: &str) {
        self.assert_status(expected);
        let json = self.json();
        assert_eq!(json["code"], code);
        assert!(json["error"].is_string());
    }
}
