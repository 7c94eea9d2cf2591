//! Common test utilities for API tests
//!
//! Every context runs the real router on a fresh in-memory store, so tests
//! need neither a database nor a network socket.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{ApiConfig, Config, JwtConfig, LogFormat};
use taskboard_shared::store::memory::InMemoryStore;
use tower::Service as _;

pub const SECRET: &str = "api-test-secret-key-at-least-32-bytes";
pub const PASSWORD: &str = "Correct-Horse-1";

/// Test context: router plus the store behind it
pub struct TestContext {
    pub app: axum::Router,
    pub store: InMemoryStore,
}

/// A registered user and their tokens
pub struct TestUser {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: None,
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        log_format: LogFormat::Pretty,
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let state = AppState::new(Arc::new(store.clone()), test_config());

        TestContext {
            app: build_router(state),
            store,
        }
    }

    /// Sends a request and returns status and parsed JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn send(
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

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "Expected JSON body, got {}: {}",
                    status,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        (status, json)
    }

    /// Registers a user through the API
    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            access_token: body["accessToken"].as_str().unwrap().to_string(),
            refresh_token: body["refreshToken"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a task through the API and returns its JSON
    pub async fn create_task(&self, user: &TestUser, body: Value) -> Value {
        let (status, task) = self
            .send(Method::POST, "/v1/tasks", Some(user.access_token.as_str()), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", task);
        task
    }
}
