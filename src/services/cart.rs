// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cart service.
//!
//! Wraps the pure [`Cart`] operations with persistence:
//! 1. Acquire the per-user cart lock (serializes writers in this instance)
//! 2. Read the stored cart, or start an empty one
//! 3. Apply the mutation; totals are recomputed by the model
//! 4. Write it back only if the stored version is unchanged
//!
//! A version conflict means another instance wrote the cart in between; the
//! whole read-modify-write is retried a bounded number of times.

use crate::db::{collections, ChangeKind, ChangeSubscription, Store};
use crate::error::{AppError, Result};
use crate::models::{Cart, CartError};
use crate::time_utils::now_millis;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Attempts before a cart write gives up on repeated version conflicts.
const MAX_SAVE_ATTEMPTS: usize = 5;

/// Shared per-user cart locks. Checkout takes the same lock.
pub type CartLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

#[derive(Clone)]
pub struct CartService {
    store: Store,
    locks: CartLocks,
}

impl CartService {
    pub fn new(store: Store, locks: CartLocks) -> Self {
        Self { store, locks }
    }

    /// Hold the cart lock for `user_id` until the guard is dropped.
    pub async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Return the user's cart, creating and storing an empty one if needed.
    pub async fn get_or_create(&self, user_id: &str) -> Result<Cart> {
        if let Some(cart) = self.store.get_cart(user_id).await? {
            return Ok(cart);
        }

        let _guard = self.lock_user(user_id).await;
        // Another request may have created it while we waited.
        if let Some(cart) = self.store.get_cart(user_id).await? {
            return Ok(cart);
        }

        match self.store.save_cart(&Cart::empty(user_id, now_millis())).await {
            Ok(cart) => {
                tracing::info!(user_id, "Created empty cart");
                Ok(cart)
            }
            // Created by another instance in the meantime.
            Err(e) if e.is_conflict() => self
                .store
                .get_cart(user_id)
                .await?
                .ok_or_else(|| AppError::Database(format!("Cart {} vanished", user_id))),
            Err(e) => Err(e),
        }
    }

    /// Add `quantity` units of a catalog product.
    pub async fn add_item(&self, user_id: &str, product_id: &str, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return Err(AppError::BadRequest(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))?;

        tracing::debug!(user_id, product_id, quantity, "Adding item to cart");

        self.mutate(user_id, |cart, now| cart.add_product(&product, quantity, now))
            .await
    }

    /// Overwrite a line's quantity; zero or less removes it.
    pub async fn set_quantity(&self, user_id: &str, product_id: &str, quantity: i64) -> Result<Cart> {
        tracing::debug!(user_id, product_id, quantity, "Setting cart quantity");

        self.mutate(user_id, |cart, now| {
            cart.set_quantity(product_id, quantity, now).map(drop)
        })
        .await
    }

    /// Remove a line. Removing an absent product is not an error.
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> Result<Cart> {
        self.mutate(user_id, |cart, now| cart.remove_item(product_id, now).map(drop))
            .await
    }

    pub async fn clear(&self, user_id: &str) -> Result<Cart> {
        self.mutate(user_id, |cart, now| {
            cart.clear(now);
            Ok(())
        })
        .await
    }

    /// Watch the user's cart.
    ///
    /// The first snapshot is the current cart; after that one snapshot per
    /// stored change.
    pub async fn subscribe(&self, user_id: &str) -> Result<CartSubscription> {
        // Subscribe before reading so no write falls between the two.
        let changes = self.store.subscribe(collections::CARTS, Some(user_id));
        let initial = self.get_or_create(user_id).await?;

        tracing::debug!(user_id, "Cart subscription opened");

        Ok(CartSubscription {
            user_id: user_id.to_string(),
            last_version: initial.version,
            initial: Some(initial),
            changes,
        })
    }

    async fn mutate<F>(&self, user_id: &str, apply: F) -> Result<Cart>
    where
        F: Fn(&mut Cart, i64) -> std::result::Result<(), CartError>,
    {
        let _guard = self.lock_user(user_id).await;

        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let now = now_millis();
            let mut cart = self
                .store
                .get_cart(user_id)
                .await?
                .unwrap_or_else(|| Cart::empty(user_id, now));

            apply(&mut cart, now)?;

            match self.store.save_cart(&cart).await {
                Ok(saved) => return Ok(saved),
                Err(e) if e.is_conflict() => {
                    tracing::warn!(user_id, attempt, "Cart version conflict, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict(format!(
            "Cart {} is being modified concurrently",
            user_id
        )))
    }
}

/// Live view of one user's cart.
///
/// Release it with [`CartSubscription::unsubscribe`] or by dropping it.
pub struct CartSubscription {
    user_id: String,
    /// Snapshots at or below this version have already been yielded
    last_version: u64,
    initial: Option<Cart>,
    changes: ChangeSubscription,
}

impl CartSubscription {
    /// Next cart snapshot, or `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Cart> {
        if let Some(cart) = self.initial.take() {
            return Some(cart);
        }

        loop {
            let event = self.changes.next().await?;
            match &event.kind {
                ChangeKind::Upserted(snapshot) => {
                    match serde_json::from_value::<Cart>(snapshot.clone()) {
                        Ok(cart) if cart.version <= self.last_version => continue,
                        Ok(cart) => {
                            self.last_version = cart.version;
                            return Some(cart);
                        }
                        Err(e) => {
                            tracing::warn!(user_id = %self.user_id, error = %e, "Undecodable cart snapshot");
                        }
                    }
                }
                ChangeKind::Deleted => {
                    self.last_version = 0;
                    return Some(Cart::empty(&self.user_id, now_millis()));
                }
            }
        }
    }

    pub fn unsubscribe(self) {
        tracing::debug!(user_id = %self.user_id, "Cart subscription closed");
        self.changes.unsubscribe();
    }
}
