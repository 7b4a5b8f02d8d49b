// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout workflow.
//!
//! Converts a user's cart into an order:
//! 1. Validate the recipient fields
//! 2. Take the user's cart lock and load a non-empty cart
//! 3. Allocate an order ID and freeze the cart lines into order lines
//! 4. Persist the order
//! 5. Clear the cart (only after the order write succeeded)
//!
//! A failure in step 5 leaves the committed order in place.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{Order, Recipient};
use crate::services::CartService;
use crate::time_utils::now_millis;
use serde::Deserialize;
use validator::Validate;

/// Recipient details submitted at checkout.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub name: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub address: String,
    #[validate(custom(function = "crate::validation::phone_number"))]
    pub phone: String,
}

impl CheckoutRequest {
    fn into_recipient(self) -> Recipient {
        Recipient {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    store: Store,
    carts: CartService,
}

impl CheckoutService {
    pub fn new(store: Store, carts: CartService) -> Self {
        Self { store, carts }
    }

    /// Place an order from the user's current cart.
    pub async fn place_order(&self, user_id: &str, request: CheckoutRequest) -> Result<Order> {
        request.validate()?;

        let _guard = self.carts.lock_user(user_id).await;

        let cart = self
            .store
            .get_cart(user_id)
            .await?
            .filter(|cart| cart.item_count > 0)
            .ok_or_else(|| AppError::BadRequest("Cart is empty".to_string()))?;

        let order_id = self.store.allocate_order_id();
        let now = now_millis();
        let order = Order::from_cart(&cart, &order_id, request.into_recipient(), now);

        // Nothing touches the cart unless this write succeeds.
        self.store.create_order(&order).await?;

        let mut cleared = cart;
        cleared.clear(now);
        if let Err(e) = self.store.save_cart(&cleared).await {
            tracing::error!(
                user_id,
                order_id = %order.id,
                error = %e,
                "Order committed but cart was not cleared"
            );
        }

        tracing::info!(
            user_id,
            order_id = %order.id,
            total_price = order.total_price.as_dong(),
            "Checkout complete"
        );

        Ok(order)
    }
}
