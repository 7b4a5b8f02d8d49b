// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shopper cart and catalog API tests.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_get_cart_creates_empty_cart() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request("GET", "/api/cart", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cart = common::body_json(response).await;
    assert_eq!(cart["id"], "u1");
    assert_eq!(cart["itemCount"], 0);
    assert_eq!(cart["totalAmount"], 0);
    assert!(cart["items"].as_object().unwrap().is_empty());

    // Persisted, not just returned
    assert!(state.store.get_cart("u1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_add_same_product_twice_merges_line() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "a", "Áo", 100, 0).await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    for quantity in [json!(null), json!(2)] {
        let mut body = json!({"productId": "a"});
        if !quantity.is_null() {
            body["quantity"] = quantity;
        }
        let response = app
            .clone()
            .oneshot(common::authed_request("POST", "/api/cart/items", &token, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let cart = state.store.get_cart("u1").await.unwrap().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items["a"].quantity, 3);
    assert_eq!(cart.item_count, 3);
    assert_eq!(cart.total_amount.as_dong(), 300);
}

#[tokio::test]
async fn test_add_freezes_discounted_price() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "c", "Giày", 1_000, 10).await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/cart/items",
            &token,
            Some(json!({"productId": "c", "quantity": 2})),
        ))
        .await
        .unwrap();

    let cart = common::body_json(response).await;
    assert_eq!(cart["items"]["c"]["price"], 900);
    assert_eq!(cart["items"]["c"]["totalPrice"], 1_800);
    assert_eq!(cart["totalAmount"], 1_800);
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/cart/items",
            &token,
            Some(json!({"productId": "missing"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_add_zero_quantity_is_bad_request() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "a", "Áo", 100, 0).await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/cart/items",
            &token,
            Some(json!({"productId": "a", "quantity": 0})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_quantity_is_bad_request_and_totals_hold() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "a", "Áo", 100, 0).await;
    state.cart_service.add_item("u1", "a", 2).await.unwrap();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            "/api/cart/items/a",
            &token,
            Some(json!({"quantity": 5_000_000_000_i64})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "bad_request");

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/cart/items",
            &token,
            Some(json!({"productId": "a", "quantity": 4_294_967_295_u32})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let cart = state.store.get_cart("u1").await.unwrap().unwrap();
    let quantities: u32 = cart.items.values().map(|line| line.quantity).sum();
    assert_eq!(cart.items["a"].quantity, 2);
    assert_eq!(cart.item_count, quantities);
    assert_eq!(cart.total_amount.as_dong(), 200);
}

#[tokio::test]
async fn test_set_quantity_zero_removes_line() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "a", "Áo", 100, 0).await;
    common::seed_product(&state.store, "b", "Quần", 50, 0).await;
    state.cart_service.add_item("u1", "a", 2).await.unwrap();
    state.cart_service.add_item("u1", "b", 1).await.unwrap();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            "/api/cart/items/b",
            &token,
            Some(json!({"quantity": 5})),
        ))
        .await
        .unwrap();
    let cart = common::body_json(response).await;
    assert_eq!(cart["itemCount"], 7);
    assert_eq!(cart["totalAmount"], 450);

    let response = app
        .oneshot(common::authed_request(
            "PUT",
            "/api/cart/items/a",
            &token,
            Some(json!({"quantity": 0})),
        ))
        .await
        .unwrap();
    let cart = common::body_json(response).await;
    assert!(cart["items"].get("a").is_none());
    assert_eq!(cart["itemCount"], 5);
    assert_eq!(cart["totalAmount"], 250);
}

#[tokio::test]
async fn test_remove_absent_item_twice_is_harmless() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "a", "Áo", 100, 0).await;
    state.cart_service.add_item("u1", "a", 1).await.unwrap();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(common::authed_request("DELETE", "/api/cart/items/zzz", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cart = common::body_json(response).await;
        assert_eq!(cart["itemCount"], 1);
        assert_eq!(cart["totalAmount"], 100);
    }
}

#[tokio::test]
async fn test_clear_cart_zeroes_totals() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "a", "Áo", 100, 0).await;
    state.cart_service.add_item("u1", "a", 4).await.unwrap();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request("DELETE", "/api/cart", &token, None))
        .await
        .unwrap();

    let cart = common::body_json(response).await;
    assert_eq!(cart["itemCount"], 0);
    assert_eq!(cart["totalAmount"], 0);
    assert!(cart["items"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "a", "Áo", 100, 0).await;
    state.cart_service.add_item("u1", "a", 4).await.unwrap();
    let token = common::create_test_jwt("u2", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request("GET", "/api/cart", &token, None))
        .await
        .unwrap();

    let cart = common::body_json(response).await;
    assert_eq!(cart["userId"], "u2");
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_catalog_search_is_case_insensitive() {
    let (app, state) = common::create_test_app();
    common::seed_product(&state.store, "a", "Áo sơ mi", 200, 50).await;
    common::seed_product(&state.store, "b", "Quần jean", 300, 0).await;
    common::seed_product(&state.store, "c", "JEAN jacket", 500, 0).await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/products?q=jean", &token, None))
        .await
        .unwrap();
    let products = common::body_json(response).await;
    let names: Vec<&str> = products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["JEAN jacket", "Quần jean"]);

    let response = app
        .oneshot(common::authed_request("GET", "/api/products/a", &token, None))
        .await
        .unwrap();
    let product = common::body_json(response).await;
    assert_eq!(product["effectivePrice"], 100);
}

#[tokio::test]
async fn test_unknown_product_lookup_is_not_found() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request("GET", "/api/products/nope", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_sync_creates_once() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/me", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/me",
            &token,
            Some(json!({"displayName": "Lan", "email": "lan@example.com"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // A later sign-in does not overwrite the stored profile
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/me",
            &token,
            Some(json!({"displayName": "Someone else"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = common::body_json(response).await;
    assert_eq!(profile["displayName"], "Lan");

    let response = app
        .oneshot(common::authed_request("GET", "/api/me", &token, None))
        .await
        .unwrap();
    let profile = common::body_json(response).await;
    assert_eq!(profile["uid"], "u1");
    assert_eq!(profile["email"], "lan@example.com");
}
