//! # pricing-core: Pure Types for the Pricing Engine
//!
//! Entities, payloads, query options and invariant checks of the pricing
//! data engine. Nothing in this crate performs I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pricing Engine Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    pricing-service                              │   │
//! │  │   currencies, money amounts, bulk price list operations         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pricing-db                                   │   │
//! │  │   SQLite stores, migrations, shared transactions                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pricing-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  query  │ │   dto   │ │  bulk   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • PURE FUNCTIONS                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Currency, MoneyAmount, PriceList and their payloads
//! - [`money`] - Integer minor-unit amounts
//! - [`query`] - Filters, relations, pagination, ordering
//! - [`dto`] - Serializable projections returned to callers
//! - [`bulk`] - Splitting and partitioning of bulk price list updates
//! - [`validation`] - Invariant checks
//! - [`error`] - Validation errors and the caller-facing error taxonomy
//! - [`id`] - Prefixed entity id generation
//!
//! ## Feature Flags
//!
//! - `sqlx`: derives `FromRow`/`Type` on entities so the storage layer can
//!   decode rows straight into them.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bulk;
pub mod dto;
pub mod error;
pub mod id;
pub mod money;
pub mod query;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ErrorKind, ValidationError};
pub use money::Money;
pub use query::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal digits assumed when a currency is created without any.
pub const DEFAULT_DECIMAL_DIGITS: u32 = 2;

/// Largest supported number of decimal digits for a currency.
pub const MAX_DECIMAL_DIGITS: u32 = 6;

/// Currency codes are ISO 4217 style, lowercased.
pub const CURRENCY_CODE_LENGTH: usize = 3;

pub const MAX_CURRENCY_NAME_LENGTH: usize = 100;

pub const MAX_CURRENCY_SYMBOL_LENGTH: usize = 10;

pub const MAX_PRICE_LIST_NAME_LENGTH: usize = 255;
