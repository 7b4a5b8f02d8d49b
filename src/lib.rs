// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Storefront: cart, checkout and order backend for the shop clients.
//!
//! This crate provides the API shared by the mobile shopping app and the
//! web admin dashboard: catalog reads, cart math, checkout, order status
//! and dashboard reports over one document store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::Store;
use services::{CartService, CheckoutService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub cart_service: CartService,
    pub checkout_service: CheckoutService,
}

impl AppState {
    /// Wire the services over one store handle.
    pub fn new(config: Config, store: Store) -> Self {
        let cart_service = CartService::new(store.clone(), Default::default());
        let checkout_service = CheckoutService::new(store.clone(), cart_service.clone());

        Self {
            config,
            store,
            cart_service,
            checkout_service,
        }
    }
}
