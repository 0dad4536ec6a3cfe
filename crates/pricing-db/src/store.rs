//! # Store Traits
//!
//! The persistence contract the pricing service is written against.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PricingService<T, C, M, P>                                            │
//! │        │                                                                │
//! │        ├── T: TransactionManager           begin / commit / rollback    │
//! │        ├── C: CurrencyStore<T::Tx>         ◄── CurrencyRepository       │
//! │        ├── M: MoneyAmountStore<T::Tx>      ◄── MoneyAmountRepository    │
//! │        └── P: PriceListStore<T::Tx>        ◄── PriceListRepository      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method takes `tx: Option<&Tx>`. With a handle the call joins that
//! transaction; without one, writes run in a transaction of their own and
//! reads run on a plain pooled connection.
//!
//! Batch writes are all-or-nothing: an element that fails rolls back the
//! whole batch, and results come back in input order.

use pricing_core::{
    CreateCurrency, CreateMoneyAmount, CreatePriceList, Currency, CurrencyFilter, FindConfig,
    MoneyAmount, MoneyAmountFilter, PriceList, PriceListFilter, UpdateCurrency, UpdateMoneyAmount,
    UpdatePriceList,
};

use crate::error::DbResult;

/// Persistence of [`Currency`] records, keyed by code.
pub trait CurrencyStore<Tx> {
    /// Fails with NotFound when `code` is unknown.
    async fn retrieve(&self, code: &str, config: &FindConfig, tx: Option<&Tx>)
        -> DbResult<Currency>;

    async fn list(
        &self,
        filter: &CurrencyFilter,
        config: &FindConfig,
        tx: Option<&Tx>,
    ) -> DbResult<Vec<Currency>>;

    /// The page selected by `config` and the total number of matches.
    async fn list_and_count(
        &self,
        filter: &CurrencyFilter,
        config: &FindConfig,
        tx: Option<&Tx>,
    ) -> DbResult<(Vec<Currency>, u64)>;

    /// Fails with UniqueViolation on an existing or repeated code.
    async fn create(&self, data: Vec<CreateCurrency>, tx: Option<&Tx>) -> DbResult<Vec<Currency>>;

    async fn update(&self, data: Vec<UpdateCurrency>, tx: Option<&Tx>) -> DbResult<Vec<Currency>>;

    /// Fails with ReferentialViolation while money amounts use a code.
    async fn delete(&self, codes: &[String], tx: Option<&Tx>) -> DbResult<()>;
}

/// Persistence of [`MoneyAmount`] records.
pub trait MoneyAmountStore<Tx> {
    async fn retrieve(&self, id: &str, config: &FindConfig, tx: Option<&Tx>)
        -> DbResult<MoneyAmount>;

    async fn list(
        &self,
        filter: &MoneyAmountFilter,
        config: &FindConfig,
        tx: Option<&Tx>,
    ) -> DbResult<Vec<MoneyAmount>>;

    async fn list_and_count(
        &self,
        filter: &MoneyAmountFilter,
        config: &FindConfig,
        tx: Option<&Tx>,
    ) -> DbResult<(Vec<MoneyAmount>, u64)>;

    /// Mints a new id per record.
    async fn create(
        &self,
        data: Vec<CreateMoneyAmount>,
        tx: Option<&Tx>,
    ) -> DbResult<Vec<MoneyAmount>>;

    async fn update(
        &self,
        data: Vec<UpdateMoneyAmount>,
        tx: Option<&Tx>,
    ) -> DbResult<Vec<MoneyAmount>>;

    async fn delete(&self, ids: &[String], tx: Option<&Tx>) -> DbResult<()>;

    /// Creates `data` as prices of `price_list_id`, overriding whatever
    /// `price_list_id` each record carried.
    async fn add_price_list_prices(
        &self,
        price_list_id: &str,
        data: Vec<CreateMoneyAmount>,
        tx: Option<&Tx>,
    ) -> DbResult<Vec<MoneyAmount>>;
}

/// Persistence of [`PriceList`] metadata. Soft-deleted lists are invisible
/// to every method.
pub trait PriceListStore<Tx> {
    async fn retrieve(&self, id: &str, config: &FindConfig, tx: Option<&Tx>)
        -> DbResult<PriceList>;

    async fn list(
        &self,
        filter: &PriceListFilter,
        config: &FindConfig,
        tx: Option<&Tx>,
    ) -> DbResult<Vec<PriceList>>;

    async fn list_and_count(
        &self,
        filter: &PriceListFilter,
        config: &FindConfig,
        tx: Option<&Tx>,
    ) -> DbResult<(Vec<PriceList>, u64)>;

    /// Persists metadata only; prices are added separately.
    async fn create(&self, data: Vec<CreatePriceList>, tx: Option<&Tx>) -> DbResult<Vec<PriceList>>;

    async fn update(&self, data: Vec<UpdatePriceList>, tx: Option<&Tx>) -> DbResult<Vec<PriceList>>;

    /// Removes the lists and, by cascade, every price they own.
    async fn delete(&self, ids: &[String], tx: Option<&Tx>) -> DbResult<()>;

    /// Marks the lists deleted and removes the prices they own.
    async fn soft_delete(&self, ids: &[String], tx: Option<&Tx>) -> DbResult<()>;
}
