// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Order aggregate.
//!
//! An order is a frozen snapshot of a cart at checkout time. Only the
//! `status` field changes afterwards, and only `Pending -> Delivered`.

use crate::models::{Cart, Money};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The single supported payment method (cash on delivery).
pub const PAYMENT_METHOD_COD: &str = "Thanh toán khi nhận hàng";

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum OrderStatus {
    #[serde(rename = "Đang giao")]
    Pending,
    #[serde(rename = "Đã giao")]
    Delivered,
}

impl OrderStatus {
    /// Whether a write moving an order from `self` to `next` is legal.
    ///
    /// Rewriting the current status is allowed so repeated admin clicks are
    /// harmless.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, _) | (OrderStatus::Delivered, OrderStatus::Delivered)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Đang giao",
            OrderStatus::Delivered => "Đã giao",
        }
    }
}

/// Who receives the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Frozen copy of a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OrderLineItem {
    /// Line ID (same as the product ID)
    pub id: String,
    /// Back-reference to the owning order
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub quantity: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub price: Money,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub subtotal: Money,
}

/// Order document stored in the `orders` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Order {
    /// Order ID (also used as document ID)
    pub id: String,
    pub user_id: String,
    /// Epoch milliseconds
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub order_date: i64,
    /// Copied from the cart at checkout; never recomputed
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_price: Money,
    pub status: OrderStatus,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub payment_method: String,
    /// Line items keyed by product ID
    #[serde(default)]
    pub items: HashMap<String, OrderLineItem>,
}

impl Order {
    /// Build a pending order from a cart snapshot.
    ///
    /// Every cart line is copied into an order line stamped with `order_id`.
    /// `total_price` is the cart's `total_amount` as it stands.
    pub fn from_cart(cart: &Cart, order_id: &str, recipient: Recipient, now_ms: i64) -> Self {
        let items = cart
            .items
            .iter()
            .map(|(product_id, line)| {
                let item = OrderLineItem {
                    id: line.product_id.clone(),
                    order_id: order_id.to_string(),
                    product_id: line.product_id.clone(),
                    product_name: line.product_name.clone(),
                    product_image: line.product_image.clone(),
                    quantity: line.quantity,
                    price: line.price,
                    subtotal: line.price.times(line.quantity),
                };
                (product_id.clone(), item)
            })
            .collect();

        Self {
            id: order_id.to_string(),
            user_id: cart.user_id.clone(),
            order_date: now_ms,
            total_price: cart.total_amount,
            status: OrderStatus::Pending,
            name: recipient.name,
            address: recipient.address,
            phone: recipient.phone,
            payment_method: PAYMENT_METHOD_COD.to_string(),
            items,
        }
    }

    /// Total number of units across all lines.
    pub fn units(&self) -> u64 {
        self.items.values().map(|i| u64::from(i.quantity)).sum()
    }
}
