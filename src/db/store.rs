// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed document store.
//!
//! Provides high-level operations for:
//! - Products (catalog)
//! - Carts (one per user, version-checked writes)
//! - Orders (frozen at checkout, guarded status updates)
//! - Users (profile copies from the identity provider)
//!
//! A `Store` is constructed once at startup and cloned into whatever needs
//! it. Every write it makes is published on its [`ChangeFeed`].

use crate::config::{Config, StoreBackend};
use crate::db::changes::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription};
use crate::db::collections;
use crate::db::{FirestoreBackend, MemoryBackend};
use crate::error::AppError;
use crate::models::{Cart, Order, OrderStatus, Product, User};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreBackend),
    Memory(Arc<MemoryBackend>),
}

/// Document store handle.
#[derive(Clone)]
pub struct Store {
    backend: Backend,
    changes: ChangeFeed,
}

impl Store {
    /// Connect to the backend selected in the configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.store_backend {
            StoreBackend::Firestore => {
                let backend = FirestoreBackend::new(&config.gcp_project_id).await?;
                Ok(Self::with_backend(Backend::Firestore(backend)))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// Fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::with_memory_backend(Arc::new(MemoryBackend::new()))
    }

    /// In-memory store over a backend the caller keeps a handle to.
    pub fn with_memory_backend(backend: Arc<MemoryBackend>) -> Self {
        Self::with_backend(Backend::Memory(backend))
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            changes: ChangeFeed::new(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Firestore(_) => "firestore",
            Backend::Memory(_) => "memory",
        }
    }

    /// Listen for changes to a collection, or to one document in it.
    pub fn subscribe(&self, collection: &str, document_id: Option<&str>) -> ChangeSubscription {
        self.changes.subscribe(collection, document_id)
    }

    pub fn change_feed(&self) -> &ChangeFeed {
        &self.changes
    }

    // ─── Generic Document Access ─────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(db) => db.get(collection, id).await,
            Backend::Memory(db) => db.get(collection, id).await,
        }
    }

    async fn list_docs<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(db) => db.list(collection).await,
            Backend::Memory(db) => db.list(collection).await,
        }
    }

    async fn list_docs_where_eq<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(db) => db.list_where_eq(collection, field, value).await,
            Backend::Memory(db) => db.list_where_eq(collection, field, value).await,
        }
    }

    async fn put_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(db) => db.set(collection, id, doc).await?,
            Backend::Memory(db) => db.set(collection, id, doc).await?,
        }
        self.publish_upsert(collection, id, doc);
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.delete(collection, id).await?,
            Backend::Memory(db) => {
                db.delete(collection, id).await?;
            }
        }
        self.changes.publish(ChangeEvent {
            collection: collection.to_string(),
            document_id: id.to_string(),
            kind: ChangeKind::Deleted,
        });
        Ok(())
    }

    async fn update_doc<T, F>(&self, collection: &str, id: &str, apply: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
        F: FnOnce(Option<T>) -> Result<T, AppError>,
    {
        let next = match &self.backend {
            Backend::Firestore(db) => db.update_with(collection, id, apply).await?,
            Backend::Memory(db) => db.update_with(collection, id, apply).await?,
        };
        self.publish_upsert(collection, id, &next);
        Ok(next)
    }

    fn publish_upsert<T: Serialize>(&self, collection: &str, id: &str, doc: &T) {
        match serde_json::to_value(doc) {
            Ok(snapshot) => self.changes.publish(ChangeEvent {
                collection: collection.to_string(),
                document_id: id.to_string(),
                kind: ChangeKind::Upserted(snapshot),
            }),
            Err(e) => {
                tracing::warn!(collection, id, error = %e, "Failed to encode change snapshot");
            }
        }
    }

    // ─── Product Operations ──────────────────────────────────────

    pub async fn get_product(&self, product_id: &str) -> Result<Option<Product>, AppError> {
        self.get_doc(collections::PRODUCTS, product_id).await
    }

    /// All products, sorted by name.
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let mut products: Vec<Product> = self.list_docs(collections::PRODUCTS).await?;
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    /// Create or replace a product.
    pub async fn put_product(&self, product: &Product) -> Result<(), AppError> {
        self.put_doc(collections::PRODUCTS, &product.id, product).await?;
        tracing::info!(product_id = %product.id, "Product stored");
        Ok(())
    }

    /// Allocate a fresh product ID.
    pub fn allocate_product_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Delete a product. Carts and orders keep their denormalized copies.
    pub async fn delete_product(&self, product_id: &str) -> Result<(), AppError> {
        if self.get_product(product_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Product {}", product_id)));
        }
        self.delete_doc(collections::PRODUCTS, product_id).await?;
        tracing::info!(product_id, "Product deleted");
        Ok(())
    }

    // ─── Cart Operations ─────────────────────────────────────────

    /// Get a user's cart, if one has been stored.
    pub async fn get_cart(&self, user_id: &str) -> Result<Option<Cart>, AppError> {
        self.get_doc(collections::CARTS, user_id).await
    }

    /// Write a cart if nobody else has written it since it was read.
    ///
    /// `cart.version` must match the stored version (0 when absent). On
    /// success the stored cart, with its version bumped, is returned;
    /// otherwise `AppError::Conflict` and nothing is written.
    pub async fn save_cart(&self, cart: &Cart) -> Result<Cart, AppError> {
        let expected = cart.version;
        let mut next = cart.clone();
        next.version = expected + 1;

        let saved = self
            .update_doc(collections::CARTS, &cart.id, move |current: Option<Cart>| {
                let stored = current.map_or(0, |c| c.version);
                if stored != expected {
                    return Err(AppError::Conflict(format!(
                        "Cart {} was modified concurrently (expected version {}, found {})",
                        next.id, expected, stored
                    )));
                }
                Ok(next)
            })
            .await?;

        tracing::debug!(
            user_id = %saved.user_id,
            version = saved.version,
            item_count = saved.item_count,
            total_amount = saved.total_amount.as_dong(),
            "Cart saved"
        );

        Ok(saved)
    }

    // ─── Order Operations ────────────────────────────────────────

    /// Allocate a fresh order ID.
    pub fn allocate_order_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub async fn create_order(&self, order: &Order) -> Result<(), AppError> {
        self.put_doc(collections::ORDERS, &order.id, order).await?;
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total_price = order.total_price.as_dong(),
            lines = order.items.len(),
            "Order created"
        );
        Ok(())
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        self.get_doc(collections::ORDERS, order_id).await
    }

    /// All orders, newest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        let mut orders: Vec<Order> = self.list_docs(collections::ORDERS).await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// A user's orders, newest first.
    pub async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        let mut orders: Vec<Order> = self
            .list_docs_where_eq(collections::ORDERS, "userId", user_id)
            .await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// Move an order to `status`, enforcing the one-way state machine.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = self
            .update_doc(collections::ORDERS, order_id, |current: Option<Order>| {
                let mut order =
                    current.ok_or_else(|| AppError::NotFound(format!("Order {}", order_id)))?;
                if !order.status.can_transition_to(status) {
                    return Err(AppError::Conflict(format!(
                        "Order {} cannot move from '{}' to '{}'",
                        order_id,
                        order.status.label(),
                        status.label()
                    )));
                }
                order.status = status;
                Ok(order)
            })
            .await?;

        tracing::info!(order_id, status = status.label(), "Order status updated");
        Ok(order)
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, uid).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.list_docs(collections::USERS).await?;
        users.sort_by(|a, b| a.creation_timestamp.cmp(&b.creation_timestamp));
        Ok(users)
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.put_doc(collections::USERS, &user.uid, user).await
    }

    /// Store a profile only if none exists yet.
    ///
    /// Returns the stored profile and whether it was created by this call.
    /// The check and the write happen in one document update, so concurrent
    /// first sign-ins create the profile exactly once.
    pub async fn create_user_if_absent(&self, user: &User) -> Result<(User, bool), AppError> {
        let mut created = false;
        let result = self
            .update_doc(collections::USERS, &user.uid, |current: Option<User>| {
                Ok(current.unwrap_or_else(|| {
                    created = true;
                    user.clone()
                }))
            })
            .await;

        let stored = match result {
            Ok(stored) => stored,
            // Lost a race with another first sign-in; theirs is the profile.
            Err(e) if e.is_conflict() => {
                created = false;
                self.get_user(&user.uid)
                    .await?
                    .ok_or_else(|| AppError::Conflict(format!("User {} is being created", user.uid)))?
            }
            Err(e) => return Err(e),
        };

        if created {
            tracing::info!(uid = %user.uid, "User profile created");
        }
        Ok((stored, created))
    }
}

fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.order_date
            .cmp(&a.order_date)
            .then_with(|| a.id.cmp(&b.id))
    });
}
