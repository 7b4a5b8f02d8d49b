// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storefront API Server
//!
//! Serves the shopping app and the admin dashboard: catalog, carts,
//! checkout, order status and sales reports.

use std::sync::Arc;
use storefront::{config::Config, db::Store, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Storefront API");

    // Connect to the document store
    let store = Store::connect(&config).await?;
    tracing::info!(backend = store.backend_name(), "Document store ready");

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(config, store));

    // Build router
    let app = storefront::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("storefront=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
