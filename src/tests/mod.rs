//! Tests for the Home Historian backend.
//!
//! ## Test Modules
//!
//! - **validator_tests**: value coercion per declared type
//! - **pagination_tests**: limit/offset/search bounds and page arithmetic
//! - **error_tests**: error envelope and status mapping
//! - **config_tests**: layered configuration and validation
//! - **db_tests**: schema and constraint behaviour
//! - **auth_tests**: password hashing and tokens
//! - **service_tests**: services against an in-memory database
//! - **api_tests**: the router end to end
//!
//! Every database test runs on its own in-memory SQLite pool.

pub mod config_tests;
pub mod service_tests;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{db, repositories, routes};

/// Defaults with an in-memory database.
pub(crate) fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.url = "sqlite::memory:".to_string();
    cfg.database.max_connections = 1;
    cfg
}

pub(crate) async fn test_pool(cfg: &AppConfig) -> SqlitePool {
    let pool = db::connect(&cfg.database).await.unwrap();
    db::init_db(&pool).await.unwrap();
    pool
}

pub(crate) async fn test_state_with(cfg: AppConfig) -> AppState {
    let database = db::Database::open(&cfg.database).await.unwrap();
    db::init_db(&database.writer).await.unwrap();
    AppState::new(database, cfg).unwrap()
}

pub(crate) async fn test_state() -> AppState {
    test_state_with(test_config()).await
}

pub(crate) async fn test_app() -> (Router, AppState) {
    let state = test_state().await;
    (routes::router(state.clone()), state)
}

/// Inserts a user directly; the stored hash is not a real one.
pub(crate) async fn seed_user(pool: &SqlitePool, username: &str) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    let email = format!("{}@example.com", username);
    repositories::users::insert(&mut conn, username, &email, "not-a-hash").await.unwrap().id
}

/// Sends one request through the router and returns status and body.
///
/// Empty bodies come back as `Null`, non-JSON bodies as a string.
pub(crate) async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}
