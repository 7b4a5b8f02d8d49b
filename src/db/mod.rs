//! Database layer (document store).

pub mod changes;
pub mod firestore;
pub mod memory;
pub mod store;

pub use changes::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSubscription};
pub use firestore::FirestoreBackend;
pub use memory::MemoryBackend;
pub use store::Store;

/// Collection names as constants.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    /// Carts keyed by owning user ID
    pub const CARTS: &str = "carts";
    pub const ORDERS: &str = "orders";
    pub const USERS: &str = "users";
}
