// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for signed-in shoppers.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Cart, Money, Order, Product, User};
use crate::services::{CartSubscription, CheckoutRequest};
use crate::time_utils::now_millis;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post, put},
    Extension, Json, Router,
};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).post(sync_me))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_cart_item))
        .route(
            "/api/cart/items/{product_id}",
            put(set_cart_item).delete(remove_cart_item),
        )
        .route("/api/cart/events", get(cart_events))
        .route("/api/checkout", post(checkout))
        .route("/api/orders", get(list_my_orders))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state
        .store
        .get_user(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    Ok(Json(profile))
}

/// Identity provider claims sent by the app after sign-in.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProfileSync {
    display_name: String,
    email: String,
    photo_url: String,
    phone_number: String,
}

/// Store the caller's profile on first sign-in.
///
/// An existing profile is returned unchanged.
async fn sync_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ProfileSync>,
) -> Result<(StatusCode, Json<User>)> {
    let candidate = User {
        uid: user.uid,
        display_name: body.display_name,
        email: body.email,
        photo_url: body.photo_url,
        phone_number: body.phone_number,
        creation_timestamp: now_millis(),
    };

    let (profile, created) = state.store.create_user_if_absent(&candidate).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(profile)))
}

// ─── Catalog ─────────────────────────────────────────────────

/// Catalog listing entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CatalogEntry {
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub product: Product,
    /// Price after discount
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub effective_price: Money,
}

impl From<Product> for CatalogEntry {
    fn from(product: Product) -> Self {
        Self {
            effective_price: product.effective_price(),
            product,
        }
    }
}

#[derive(Deserialize)]
struct CatalogQuery {
    /// Case-insensitive name filter
    q: Option<String>,
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<CatalogEntry>>> {
    let products = state.store.list_products().await?;

    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let entries = products
        .into_iter()
        .filter(|p| {
            needle
                .as_deref()
                .map_or(true, |q| p.name.to_lowercase().contains(q))
        })
        .map(CatalogEntry::from)
        .collect();

    Ok(Json(entries))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CatalogEntry>> {
    let product = state
        .store
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {}", id)))?;

    Ok(Json(product.into()))
}

// ─── Cart ────────────────────────────────────────────────────

async fn get_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Cart>> {
    Ok(Json(state.cart_service.get_or_create(&user.uid).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest {
    product_id: String,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

async fn add_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<Cart>> {
    let cart = state
        .cart_service
        .add_item(&user.uid, &body.product_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

#[derive(Deserialize)]
struct SetQuantityRequest {
    quantity: i64,
}

async fn set_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
    Json(body): Json<SetQuantityRequest>,
) -> Result<Json<Cart>> {
    let cart = state
        .cart_service
        .set_quantity(&user.uid, &product_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

async fn remove_cart_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> Result<Json<Cart>> {
    let cart = state
        .cart_service
        .remove_item(&user.uid, &product_id)
        .await?;
    Ok(Json(cart))
}

async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Cart>> {
    Ok(Json(state.cart_service.clear(&user.uid).await?))
}

/// Stream the caller's cart: the current snapshot, then one per change.
async fn cart_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let subscription = state.cart_service.subscribe(&user.uid).await?;
    tracing::debug!(uid = %user.uid, "Cart event stream opened");

    // The subscription is dropped, and so released, when the client goes away.
    let stream = futures_util::stream::unfold(subscription, |mut sub: CartSubscription| async move {
        let cart = sub.next().await?;
        match Event::default().event("cart").json_data(&cart) {
            Ok(event) => Some((Ok::<_, Infallible>(event), sub)),
            Err(e) => {
                tracing::error!(user_id = %cart.user_id, error = %e, "Failed to encode cart event");
                sub.unsubscribe();
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ─── Checkout & Orders ───────────────────────────────────────

async fn checkout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.checkout_service.place_order(&user.uid, body).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Caller's order history, newest first.
async fn list_my_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.store.list_orders_for_user(&user.uid).await?))
}
