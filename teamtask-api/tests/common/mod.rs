//! Common test utilities for integration tests
//!
//! Builds the full router over a fresh `MemoryStore` and drives it in-process
//! with `tower::ServiceExt::oneshot`:
//! - Test user creation with tokens
//! - JSON request helpers
//! - Task seeding

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use teamtask_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, JwtConfig, StoreBackend, StoreConfig},
};
use teamtask_shared::{
    models::{Role, UserProfile},
    repository::NewUser,
    store::MemoryStore,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "secret123";

/// An account with a valid token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub profile: UserProfile,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.profile.id
    }
}

/// Router plus direct access to its state and store
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn test_config(environment: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: environment.to_string(),
            cors_origins: vec!["*".to_string()],
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
            connect_timeout_seconds: 1,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
            lifetime: chrono::Duration::hours(1),
        },
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_environment("development")
    }

    pub fn production() -> Self {
        Self::with_environment("production")
    }

    fn with_environment(environment: &str) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), test_config(environment));
        let app = build_router(state.clone());

        Self { app, state, store }
    }

    /// Sends a request and returns the status and JSON body (`null` if empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body for {}: {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates an account directly through the repository
    pub async fn seed_user(&self, name: &str, role: Role) -> TestUser {
        let profile = self
            .state
            .users
            .create(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password: TEST_PASSWORD.to_string(),
                role,
            })
            .await
            .unwrap();

        let token = self.state.tokens.issue(profile.id).unwrap();
        TestUser { profile, token }
    }

    pub async fn seed_manager(&self, name: &str) -> TestUser {
        self.seed_user(name, Role::Manager).await
    }

    pub async fn seed_member(&self, name: &str) -> TestUser {
        self.seed_user(name, Role::User).await
    }

    /// Creates a task through the API and returns its JSON
    pub async fn create_task(&self, manager: &TestUser, title: &str, assignee: Uuid) -> Value {
        let (status, body) = self
            .post(
                "/api/tasks",
                Some(&manager.token),
                json!({ "title": title, "assignedTo": assignee }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "task creation failed: {}", body);

        body["data"].clone()
    }

    pub async fn task_ids(&self, token: &str) -> Vec<String> {
        let (status, body) = self.get("/api/tasks", token).await;
        assert_eq!(status, StatusCode::OK);

        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect()
    }
}
