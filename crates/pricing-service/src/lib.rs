//! # pricing-service: Pricing Orchestration
//!
//! The entry point for callers of the pricing engine. Wraps the stores of
//! `pricing-db` in transaction scopes and hands back transfer objects.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller (API layer, seed tool)                                         │
//! │       │  Vec<CreatePriceListInput>, FindConfig, Option<&tx>            │
//! │       ▼                                                                 │
//! │  PricingService ──── scopes, bulk planning, DTO projection             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CurrencyStore / MoneyAmountStore / PriceListStore (pricing-db)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pricing_core::{CreateMoneyAmount, CreatePriceList, CreatePriceListInput};
//! use pricing_db::{Database, DbConfig};
//! use pricing_service::SqlitePricingService;
//!
//! let db = Database::new(DbConfig::new("pricing.db")).await?;
//! let service = SqlitePricingService::from_database(db);
//!
//! let lists = service
//!     .create_price_lists(
//!         vec![CreatePriceListInput::new(CreatePriceList::new("Summer Sale"))
//!             .with_price(CreateMoneyAmount::new("usd", 1000))],
//!         None,
//!     )
//!     .await?;
//! ```

pub mod error;
pub mod service;

pub use error::{PricingError, PricingResult};
pub use service::{PricingService, SqlitePricingService};
