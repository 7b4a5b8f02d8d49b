// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog product model.

use crate::models::Money;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Product document stored in the `products` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Product {
    /// Product ID (also used as document ID)
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit list price
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub price: Money,
    /// Image reference (URL)
    #[serde(default)]
    pub image_url: String,
    /// Discount percentage, 0..=100
    #[serde(default)]
    pub discount_percent: u8,
}

impl Product {
    /// Price after the product discount.
    pub fn effective_price(&self) -> Money {
        self.price.discounted(self.discount_percent)
    }
}

/// Admin request body for creating a product (a product without its ID).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "crate::validation::non_negative"))]
    pub price: Money,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    #[validate(range(max = 100))]
    pub discount_percent: u8,
}

impl NewProduct {
    pub fn into_product(self, id: String) -> Product {
        Product {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            discount_percent: self.discount_percent,
        }
    }
}
