// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shopping cart aggregate.
//!
//! A cart is keyed by its owner's user ID (one cart per user). The derived
//! fields `item_count` and `total_amount` are pure functions of `items` and
//! are recomputed by every mutation before the cart is persisted.

use crate::models::{Money, Product};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Most units of a single product one cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// A cart mutation that would leave the totals unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Quantity {requested} exceeds the limit of {} per product", MAX_LINE_QUANTITY)]
    QuantityTooLarge { requested: u64 },

    #[error("Cart total is out of range")]
    TotalOverflow,
}

/// One product line inside a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CartLineItem {
    /// Line ID (same as the product ID)
    pub id: String,
    pub product_id: String,
    /// Product name copied at add time
    pub product_name: String,
    /// Product image copied at add time
    pub product_image: String,
    /// Effective unit price frozen when the line was created
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub price: Money,
    pub quantity: u32,
    /// `price * quantity`
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_price: Money,
}

impl CartLineItem {
    fn from_product(product: &Product, quantity: u32) -> Self {
        let price = product.effective_price();
        Self {
            id: product.id.clone(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_image: product.image_url.clone(),
            price,
            quantity,
            total_price: price.times(quantity),
        }
    }
}

/// Cart document stored in the `carts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Cart {
    /// Cart ID (same as the owning user ID)
    pub id: String,
    pub user_id: String,
    /// Line items keyed by product ID
    #[serde(default)]
    pub items: HashMap<String, CartLineItem>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_amount: Money,
    #[serde(default)]
    pub item_count: u32,
    /// Epoch milliseconds
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub created_at: i64,
    /// Epoch milliseconds
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub updated_at: i64,
    /// Optimistic concurrency counter, bumped on every successful write
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub version: u64,
}

impl Cart {
    /// A fresh cart with no lines.
    pub fn empty(user_id: &str, now_ms: i64) -> Self {
        Self {
            id: user_id.to_string(),
            user_id: user_id.to_string(),
            items: HashMap::new(),
            total_amount: Money::ZERO,
            item_count: 0,
            created_at: now_ms,
            updated_at: now_ms,
            version: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line keeps its frozen unit price and grows by `quantity`.
    /// A new line freezes the product's effective price. `quantity == 0` is a
    /// no-op. On error the cart is unchanged.
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: u32,
        now_ms: i64,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Ok(());
        }

        let current = self.items.get(&product.id).map_or(0, |line| line.quantity);
        let quantity = line_quantity(u64::from(current) + u64::from(quantity))?;

        let mut items = self.items.clone();
        items
            .entry(product.id.clone())
            .and_modify(|line| line.quantity = quantity)
            .or_insert_with(|| CartLineItem::from_product(product, quantity));

        self.replace_items(items, now_ms)
    }

    /// Overwrite a line's quantity. Zero or negative removes the line.
    ///
    /// Returns `false` if there was no line to change.
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        quantity: i64,
        now_ms: i64,
    ) -> Result<bool, CartError> {
        if quantity <= 0 {
            return self.remove_item(product_id, now_ms);
        }
        let quantity = line_quantity(quantity.unsigned_abs())?;

        if !self.items.contains_key(product_id) {
            return Ok(false);
        }
        let mut items = self.items.clone();
        if let Some(line) = items.get_mut(product_id) {
            line.quantity = quantity;
        }

        self.replace_items(items, now_ms)?;
        Ok(true)
    }

    /// Remove a line. Absent lines are not an error.
    pub fn remove_item(&mut self, product_id: &str, now_ms: i64) -> Result<bool, CartError> {
        let mut items = self.items.clone();
        let removed = items.remove(product_id).is_some();
        self.replace_items(items, now_ms)?;
        Ok(removed)
    }

    /// Drop every line.
    pub fn clear(&mut self, now_ms: i64) {
        self.items.clear();
        self.item_count = 0;
        self.total_amount = Money::ZERO;
        self.updated_at = now_ms;
    }

    /// Recompute line subtotals and the cart totals from `items`.
    pub fn recompute(&mut self) -> Result<(), CartError> {
        let mut items = std::mem::take(&mut self.items);
        let totals = compute_totals(&mut items);
        self.items = items;

        let (item_count, total_amount) = totals?;
        self.item_count = item_count;
        self.total_amount = total_amount;
        Ok(())
    }

    fn replace_items(
        &mut self,
        mut items: HashMap<String, CartLineItem>,
        now_ms: i64,
    ) -> Result<(), CartError> {
        let (item_count, total_amount) = compute_totals(&mut items)?;
        self.items = items;
        self.item_count = item_count;
        self.total_amount = total_amount;
        self.updated_at = now_ms;
        Ok(())
    }
}

fn line_quantity(requested: u64) -> Result<u32, CartError> {
    u32::try_from(requested)
        .ok()
        .filter(|q| *q <= MAX_LINE_QUANTITY)
        .ok_or(CartError::QuantityTooLarge { requested })
}

fn compute_totals(items: &mut HashMap<String, CartLineItem>) -> Result<(u32, Money), CartError> {
    let mut item_count: u32 = 0;
    let mut total_amount = Money::ZERO;

    for line in items.values_mut() {
        line.total_price = line
            .price
            .checked_times(line.quantity)
            .ok_or(CartError::TotalOverflow)?;
        item_count = item_count
            .checked_add(line.quantity)
            .ok_or(CartError::TotalOverflow)?;
        total_amount = total_amount
            .checked_add(line.total_price)
            .ok_or(CartError::TotalOverflow)?;
    }

    Ok((item_count, total_amount))
}
