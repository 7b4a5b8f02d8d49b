// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin dashboard routes.
//!
//! Both auth middlewares are applied in routes/mod.rs; every handler here
//! runs for an admin caller only.

use crate::db::{collections, ChangeKind, ChangeSubscription};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{DashboardReport, NewProduct, Order, OrderStatus, Product, User};
use crate::time_utils::offset_from_minutes;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, put},
    Extension, Json, Router,
};
use futures_util::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/products",
            get(list_products).post(create_product).delete(delete_product),
        )
        .route("/users", get(list_users).post(upsert_user))
        .route("/orders", get(list_orders))
        .route("/orders/events", get(order_events))
        .route("/orders/{id}/status", put(update_order_status))
        .route("/stats/dashboard", get(dashboard))
}

// ─── Products ────────────────────────────────────────────────

async fn list_products(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.store.list_products().await?))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    body.validate()?;

    let product = body.into_product(state.store.allocate_product_id());
    state.store.put_product(&product).await?;

    tracing::info!(admin = %admin.uid, product_id = %product.id, "Admin created product");
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteProductRequest {
    product_id: String,
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Json(body): Json<DeleteProductRequest>,
) -> Result<StatusCode> {
    state.store.delete_product(&body.product_id).await?;

    tracing::info!(admin = %admin.uid, product_id = %body.product_id, "Admin deleted product");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Users ───────────────────────────────────────────────────

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

/// Create or overwrite a user profile.
async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Json(user): Json<User>,
) -> Result<(StatusCode, Json<User>)> {
    if user.uid.trim().is_empty() {
        return Err(AppError::BadRequest("uid must not be blank".to_string()));
    }

    state.store.upsert_user(&user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// ─── Orders ──────────────────────────────────────────────────

async fn list_orders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.store.list_orders().await?))
}

#[derive(Deserialize)]
struct StatusUpdateRequest {
    status: OrderStatus,
}

async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Order>> {
    let order = state.store.update_order_status(&id, body.status).await?;

    tracing::info!(
        admin = %admin.uid,
        order_id = %order.id,
        status = order.status.label(),
        "Admin updated order status"
    );
    Ok(Json(order))
}

/// Stream every order write as an `order` event carrying the stored order.
async fn order_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let subscription = state.store.subscribe(collections::ORDERS, None);

    let stream = futures_util::stream::unfold(
        subscription,
        |mut sub: ChangeSubscription| async move {
            loop {
                let change = sub.next().await?;
                let ChangeKind::Upserted(snapshot) = &change.kind else {
                    continue;
                };
                match Event::default()
                    .event("order")
                    .id(change.document_id.clone())
                    .json_data(snapshot)
                {
                    Ok(event) => return Some((Ok::<_, Infallible>(event), sub)),
                    Err(e) => {
                        tracing::warn!(order_id = %change.document_id, error = %e, "Skipping unencodable order event");
                    }
                }
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Deserialize)]
struct DashboardQuery {
    /// Length of the best-seller list
    top: Option<usize>,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardReport>> {
    let orders = state.store.list_orders().await?;
    let user_count = state.store.list_users().await?.len();
    let product_count = state.store.list_products().await?.len();

    let top_n = query.top.unwrap_or(state.config.top_products);
    let offset = offset_from_minutes(state.config.report_utc_offset_minutes);

    let report =
        DashboardReport::from_orders(&orders, top_n, offset).with_counts(user_count, product_count);

    tracing::debug!(
        orders = report.order_count,
        revenue = report.total_revenue.as_dong(),
        "Dashboard report computed"
    );
    Ok(Json(report))
}
