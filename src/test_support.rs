//! Shared helpers for router-level tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::db::{Collection, DocumentStore, MemoryStore};
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-signing-secret";

pub fn test_state() -> AppState {
    let config = AppConfig {
        jwt_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(config, Arc::new(MemoryStore::new()))
}

pub fn app(state: &AppState) -> Router {
    crate::create_app(state.clone())
}

/// Bearer header value for a credential asserting `email`.
pub fn bearer(state: &AppState, email: &str) -> String {
    let identity = json!({ "email": email }).as_object().cloned().unwrap();
    format!("Bearer {}", state.tokens.issue(identity).unwrap())
}

/// Store a user record directly, bypassing the API.
pub async fn seed_user(state: &AppState, email: &str, role: Option<&str>) -> String {
    let mut user = json!({ "email": email });
    if let Some(role) = role {
        user["role"] = json!(role);
    }
    state
        .store
        .insert_one(Collection::Users, user.as_object().cloned().unwrap())
        .await
        .unwrap()
        .inserted_id
}

pub fn request(method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the body as JSON. Empty bodies decode to `null`,
/// non-JSON bodies to a string.
pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn call(
    state: &AppState,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send(app(state), request(method, uri, auth, body)).await
}
