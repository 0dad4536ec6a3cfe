//! # pricing-db: Storage Layer for the Pricing Engine
//!
//! SQLite persistence for currencies, money amounts and price lists, built
//! on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pricing Data Flow                                │
//! │                                                                         │
//! │  PricingService (pricing-service)                                      │
//! │       │  begin() ─► Some(&tx) to every store call ─► commit/rollback   │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pricing-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐ │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │ │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │ │   │
//! │  │   │               │    │ CurrencyRepository │  │            │ │   │
//! │  │   │ SqlitePool    │◄───│ MoneyAmountRepo... │  │ 001_pricing│ │   │
//! │  │   │ Transactions  │    │ PriceListRepo...   │  │ _schema    │ │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘ │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (PRICING_DB_PATH)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven configuration
//! - [`migrations`] - Embedded database migrations
//! - [`transaction`] - Shared transaction handles
//! - [`store`] - Store traits the service is generic over
//! - [`repository`] - SQLite store implementations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pricing_db::{Database, DbConfig, MoneyAmountStore, TransactionManager};
//!
//! let db = Database::new(DbConfig::new("pricing.db")).await?;
//!
//! let tx = db.begin().await?;
//! let prices = db
//!     .money_amounts()
//!     .create(vec![CreateMoneyAmount::new("usd", 1000)], Some(&tx))
//!     .await?;
//! db.commit(tx).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;
pub mod transaction;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, PricingConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{CurrencyStore, MoneyAmountStore, PriceListStore};
pub use transaction::{Savepoint, SqliteTransaction, TransactionManager};

// Repository re-exports for convenience
pub use repository::currency::CurrencyRepository;
pub use repository::money_amount::MoneyAmountRepository;
pub use repository::price_list::PriceListRepository;
