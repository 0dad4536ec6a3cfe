//! # Entity Ids
//!
//! Ids are generated server-side and prefixed by entity kind:
//!
//! ```text
//! ma_01928f5e7b3c7d2a9f4e0c1b2a3d4e5f   ← MoneyAmount
//! pl_01928f5e7b3c7d2a9f4e0c1b2a3d4e60   ← PriceList
//!     └──────── UUID v7 (time-ordered) ────────┘
//! ```
//!
//! Callers never supply ids on create, which is what lets bulk update
//! paths partition a batch purely by id presence.

use uuid::Uuid;

/// Prefix for MoneyAmount ids.
pub const MONEY_AMOUNT_ID_PREFIX: &str = "ma";

/// Prefix for PriceList ids.
pub const PRICE_LIST_ID_PREFIX: &str = "pl";

/// Generates a new opaque id for the given entity prefix.
///
/// ## Example
/// ```rust
/// use pricing_core::id::{generate_entity_id, MONEY_AMOUNT_ID_PREFIX};
///
/// let id = generate_entity_id(MONEY_AMOUNT_ID_PREFIX);
/// assert!(id.starts_with("ma_"));
/// ```
pub fn generate_entity_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7().simple())
}
