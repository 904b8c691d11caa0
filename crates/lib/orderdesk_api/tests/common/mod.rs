//! Shared helpers for router-level integration tests.
//!
//! Tests run the full router over the in-memory store, so no database is
//! needed; requests go through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use orderdesk_api::config::ApiConfig;
use orderdesk_api::AppState;
use orderdesk_core::auth::password::hash_password;
use orderdesk_core::store::memory::MemoryStore;
use orderdesk_core::store::DynStore;

pub const JWT_SECRET: &str = "test-secret";

/// State over a fresh in-memory store seeded with `user`/`password`.
pub async fn test_state() -> AppState {
    let store: DynStore = Arc::new(MemoryStore::new());
    let hash = hash_password("password").unwrap();
    store
        .create_user("user", &hash, Some("user@example.com"), &["USER".into()])
        .await
        .unwrap();
    AppState::new(
        store,
        ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            database_url: None,
            jwt_secret: JWT_SECRET.into(),
        },
    )
}

pub async fn test_app() -> (Router, AppState) {
    let state = test_state().await;
    (orderdesk_api::router(state.clone()), state)
}

/// Send one request, returning status and parsed JSON body (Null when empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}

/// Log in as the seeded user and return (access token, refresh token).
pub async fn login(app: &Router) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "user", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}

/// A valid order request body with one 2 × 100.0 item.
pub fn sample_order(number: &str) -> Value {
    json!({
        "orderNumber": number,
        "customerName": "Test Customer",
        "shippingAddress": "1 Main St",
        "items": [{
            "sku": "SKU-001",
            "name": "Widget",
            "quantity": 2,
            "unitPrice": 100.0
        }]
    })
}
