// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod cart;
pub mod money;
pub mod order;
pub mod product;
pub mod report;
pub mod user;

pub use cart::{Cart, CartError, CartLineItem, MAX_LINE_QUANTITY};
pub use money::Money;
pub use order::{Order, OrderLineItem, OrderStatus, Recipient};
pub use product::{NewProduct, Product};
pub use report::DashboardReport;
pub use user::User;
