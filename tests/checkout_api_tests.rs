// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout and order history API tests.

use axum::http::StatusCode;
use serde_json::{json, Value};
use storefront::AppState;
use tower::ServiceExt;

mod common;

fn recipient() -> Value {
    json!({
        "name": "Nguyễn Văn A",
        "address": "12 Lê Lợi, Quận 1",
        "phone": "0901234567"
    })
}

/// Cart of {A: 2 @ 100, B: 1 @ 50}.
async fn fill_cart(state: &AppState, uid: &str) {
    common::seed_product(&state.store, "a", "Áo", 100, 0).await;
    common::seed_product(&state.store, "b", "Quần", 50, 0).await;
    state.cart_service.add_item(uid, "a", 2).await.unwrap();
    state.cart_service.add_item(uid, "b", 1).await.unwrap();
}

#[tokio::test]
async fn test_checkout_creates_order_and_clears_cart() {
    let (app, state) = common::create_test_app();
    fill_cart(&state, "u1").await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request("POST", "/api/checkout", &token, Some(recipient())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let order = common::body_json(response).await;
    assert_eq!(order["userId"], "u1");
    assert_eq!(order["totalPrice"], 250);
    assert_eq!(order["status"], "Đang giao");
    assert_eq!(order["paymentMethod"], "Thanh toán khi nhận hàng");
    assert_eq!(order["phone"], "0901234567");
    assert_eq!(order["items"]["a"]["subtotal"], 200);
    assert_eq!(order["items"]["b"]["subtotal"], 50);
    assert_eq!(order["items"]["a"]["orderId"], order["id"]);

    let cart = state.store.get_cart("u1").await.unwrap().unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.item_count, 0);
    assert_eq!(cart.total_amount.as_dong(), 0);
}

#[tokio::test]
async fn test_order_total_survives_price_change() {
    let (app, state) = common::create_test_app();
    fill_cart(&state, "u1").await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request("POST", "/api/checkout", &token, Some(recipient())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    common::seed_product(&state.store, "a", "Áo", 999, 50).await;

    let response = app
        .oneshot(common::authed_request("GET", "/api/orders", &token, None))
        .await
        .unwrap();
    let orders = common::body_json(response).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["totalPrice"], 250);
    assert_eq!(orders[0]["items"]["a"]["price"], 100);
}

#[tokio::test]
async fn test_checkout_empty_cart_is_bad_request() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request("POST", "/api/checkout", &token, Some(recipient())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_rejects_bad_recipient() {
    let (app, state) = common::create_test_app();
    fill_cart(&state, "u1").await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let bad_bodies = [
        json!({"name": "  ", "address": "12 Lê Lợi", "phone": "0901234567"}),
        json!({"name": "A", "address": "", "phone": "0901234567"}),
        json!({"name": "A", "address": "12 Lê Lợi", "phone": "901234567"}),
        json!({"name": "A", "address": "12 Lê Lợi", "phone": "09012345ab"}),
    ];

    for body in bad_bodies {
        let response = app
            .clone()
            .oneshot(common::authed_request("POST", "/api/checkout", &token, Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
        let error = common::body_json(response).await;
        assert_eq!(error["error"], "validation_error");
        assert!(error["details"].is_string());
    }

    // Nothing was touched
    assert!(state.store.list_orders().await.unwrap().is_empty());
    let cart = state.store.get_cart("u1").await.unwrap().unwrap();
    assert_eq!(cart.item_count, 3);
}

#[tokio::test]
async fn test_order_history_is_per_user_newest_first() {
    let (app, state) = common::create_test_app();
    fill_cart(&state, "u1").await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let first = state
        .checkout_service
        .place_order("u1", serde_json::from_value(recipient()).unwrap())
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    state.cart_service.add_item("u1", "b", 3).await.unwrap();
    let second = state
        .checkout_service
        .place_order("u1", serde_json::from_value(recipient()).unwrap())
        .await
        .unwrap();

    // Another shopper's order must not show up
    state.cart_service.add_item("u2", "a", 1).await.unwrap();
    state
        .checkout_service
        .place_order("u2", serde_json::from_value(recipient()).unwrap())
        .await
        .unwrap();

    let response = app
        .oneshot(common::authed_request("GET", "/api/orders", &token, None))
        .await
        .unwrap();
    let orders = common::body_json(response).await;
    let ids: Vec<&str> = orders
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap())
        .collect();

    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
}
