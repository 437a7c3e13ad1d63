//! Shared fixtures for integration tests
//!
//! Classifiers train on the synthetic tables under `data/` and write their
//! artifacts into a temporary directory.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use symptoscan::{
    accounts::AccountService,
    api::{build_router, AppState},
    chat::{ChatCompletion, ChatService},
    config::{AccountsConfig, ModelsConfig},
    ml::{ClassifierStore, PredictionService},
    state::{create_in_memory_store, HealthStore},
};
use tempfile::TempDir;
use tower::ServiceExt;

pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

pub fn models_config(model_dir: &TempDir) -> ModelsConfig {
    ModelsConfig {
        model_dir: model_dir.path().join("models"),
        data_dir: data_dir(),
        n_trees: 10,
        seed: 42,
        test_size: 0.2,
        warm_up: false,
    }
}

/// Application wired around an in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn HealthStore>,
    pub state: AppState,
    _models: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_backend(None)
    }

    pub fn with_backend(backend: Option<Arc<dyn ChatCompletion>>) -> Self {
        let models = TempDir::new().unwrap();
        let store = create_in_memory_store();

        let predictions =
            PredictionService::new(Arc::new(ClassifierStore::new(models_config(&models))));
        let accounts = Arc::new(AccountService::new(store.clone(), AccountsConfig::default()));
        let chat = Arc::new(ChatService::new(store.clone(), backend, 10));

        let state = AppState::new(store.clone(), predictions, accounts, chat);
        Self {
            router: build_router(state.clone()),
            store,
            state,
            _models: models,
        }
    }

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
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Sign up a user and return the session token
    pub async fn signup(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/v1/accounts/signup",
                None,
                serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "correct-horse-battery",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Sign up a user with the staff flag and return the session token
    pub async fn signup_staff(&self, username: &str) -> String {
        let token = self.signup(username).await;
        self.state.accounts.set_staff(username, true).await.unwrap();
        token
    }
}

pub fn diabetes_form() -> Value {
    serde_json::json!({
        "glucose": 168.0,
        "blood_pressure": 88.0,
        "bmi": 38.5,
        "age": 61,
        "pregnancies": 3,
        "insulin": 120.0
    })
}
