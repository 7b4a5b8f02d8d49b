//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in the `users` collection.
///
/// Copied from the identity provider on first sign-in and not re-synced
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Identity provider UID (also used as document ID)
    pub uid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    /// Profile picture URL
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub phone_number: String,
    /// When the account was created (epoch milliseconds)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub creation_timestamp: i64,
}
