// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cart;
pub mod checkout;

pub use cart::{CartLocks, CartService, CartSubscription};
pub use checkout::{CheckoutRequest, CheckoutService};
