// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use serde_json::Value;
use std::sync::Arc;
use storefront::config::{Config, StoreBackend};
use storefront::db::Store;
use storefront::middleware::auth::create_jwt;
use storefront::models::{Money, Product};
use storefront::routes::create_router;
use storefront::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_firestore_store() -> Store {
    let mut config = Config::test_default();
    config.store_backend = StoreBackend::Firestore;
    Store::connect(&config)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_store(Store::in_memory())
}

#[allow(dead_code)]
pub fn create_test_app_with_store(store: Store) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), store));
    (create_router(state.clone()), state)
}

/// Shopper session token.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    create_jwt(uid, None, signing_key).expect("Failed to create JWT")
}

/// Admin dashboard session token.
#[allow(dead_code)]
pub fn create_admin_jwt(uid: &str, signing_key: &[u8]) -> String {
    create_jwt(uid, Some("admin"), signing_key).expect("Failed to create JWT")
}

/// Store a catalog product directly.
#[allow(dead_code)]
pub async fn seed_product(store: &Store, id: &str, name: &str, price: i64, discount: u8) -> Product {
    let product = Product {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        price: Money::from_dong(price),
        image_url: format!("https://img.example.com/{}.jpg", id),
        discount_percent: discount,
    };
    store.put_product(&product).await.expect("seed product");
    product
}

/// Build an authenticated request, with a JSON body when `body` is set.
#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
