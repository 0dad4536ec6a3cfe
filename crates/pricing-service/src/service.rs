//! # Pricing Service
//!
//! The orchestrator callers talk to. It owns one store per entity plus a
//! transaction manager, and returns transfer objects only.
//!
//! ## Transaction Scopes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Composite operation (create/update/delete price lists)                │
//! │                                                                         │
//! │   tx: Some(&caller)  ──► savepoint()                                    │
//! │                          Scope::Caller   run ──► Ok  ──► release        │
//! │                                              └─► Err ──► rollback_to    │
//! │                          (the caller still commits or rolls back tx)    │
//! │                                                                         │
//! │   tx: None           ──► begin()                                        │
//! │                          Scope::Owned    run ──► Ok  ──► commit         │
//! │                                              └─► Err ──► rollback       │
//! │                                                                         │
//! │   Any error ──► PricingError::TransactionAborted { operation, source } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Simple delegations (money amounts, currencies, price list reads) hand
//! `tx` straight to the store: a store write without a handle runs in a
//! transaction of its own, and reads need none.
//!
//! ## Bulk Price List Update
//! ```text
//!   inputs ──► PriceListUpdatePlan::from_inputs
//!                 │
//!                 ├── price_lists.update(metadata)           (sequential)
//!                 │
//!                 └── try_join!( money_amounts.update(existing),
//!                                money_amounts.create(new) )  (concurrent)
//! ```
//! Both partitions share the scope's handle; the handle's mutex orders
//! their statements.

use pricing_core::bulk::PriceListUpdatePlan;
use pricing_core::dto::{to_dtos, CurrencyDto, MoneyAmountDto, PriceListDto};
use pricing_core::{
    CreateCurrency, CreateMoneyAmount, CreatePriceListInput, CurrencyFilter, FindConfig,
    MoneyAmountFilter, PriceListFilter, UpdateCurrency, UpdateMoneyAmount, UpdatePriceListInput,
};
use pricing_db::{
    CurrencyRepository, CurrencyStore, Database, DbError, DbResult, MoneyAmountRepository,
    MoneyAmountStore, PriceListRepository, PriceListStore, TransactionManager,
};
use tracing::{debug, info, warn};

use crate::error::{PricingError, PricingResult};

// =============================================================================
// Service
// =============================================================================

/// Orchestrates the pricing stores under explicit transaction scopes.
#[derive(Debug, Clone)]
pub struct PricingService<T, C, M, P> {
    transactions: T,
    currencies: C,
    money_amounts: M,
    price_lists: P,
}

/// The service wired to the SQLite stores.
pub type SqlitePricingService =
    PricingService<Database, CurrencyRepository, MoneyAmountRepository, PriceListRepository>;

impl SqlitePricingService {
    /// Builds the service on top of one database pool.
    pub fn from_database(db: Database) -> Self {
        PricingService::new(
            db.currencies(),
            db.money_amounts(),
            db.price_lists(),
            db,
        )
    }
}

/// Where a composite operation runs.
enum Scope<'a, Tx, Sp> {
    /// The caller's transaction, marked by a savepoint the operation
    /// releases or rolls back to. The caller commits or rolls back `tx`.
    Caller { tx: &'a Tx, savepoint: Sp },
    /// A transaction this service opened and must close.
    Owned(Tx),
}

impl<Tx, Sp> Scope<'_, Tx, Sp> {
    fn tx(&self) -> &Tx {
        match self {
            Scope::Caller { tx, .. } => *tx,
            Scope::Owned(tx) => tx,
        }
    }
}

impl<T, C, M, P> PricingService<T, C, M, P>
where
    T: TransactionManager,
    C: CurrencyStore<T::Tx>,
    M: MoneyAmountStore<T::Tx>,
    P: PriceListStore<T::Tx>,
{
    pub fn new(currencies: C, money_amounts: M, price_lists: P, transactions: T) -> Self {
        PricingService {
            transactions,
            currencies,
            money_amounts,
            price_lists,
        }
    }

    /// The transaction manager, for callers that want to span several
    /// service calls with one handle.
    pub fn transactions(&self) -> &T {
        &self.transactions
    }

    // =========================================================================
    // Money Amounts
    // =========================================================================

    pub async fn retrieve(
        &self,
        id: &str,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<MoneyAmountDto> {
        let money_amount = self.money_amounts.retrieve(id, config, tx).await?;
        Ok(MoneyAmountDto::from(&money_amount))
    }

    pub async fn list(
        &self,
        filter: &MoneyAmountFilter,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<MoneyAmountDto>> {
        let money_amounts = self.money_amounts.list(filter, config, tx).await?;
        Ok(to_dtos(&money_amounts))
    }

    pub async fn list_and_count(
        &self,
        filter: &MoneyAmountFilter,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<(Vec<MoneyAmountDto>, u64)> {
        let (money_amounts, count) = self.money_amounts.list_and_count(filter, config, tx).await?;
        Ok((to_dtos(&money_amounts), count))
    }

    pub async fn create(
        &self,
        data: Vec<CreateMoneyAmount>,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<MoneyAmountDto>> {
        let money_amounts = self.money_amounts.create(data, tx).await?;
        Ok(to_dtos(&money_amounts))
    }

    pub async fn update(
        &self,
        data: Vec<UpdateMoneyAmount>,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<MoneyAmountDto>> {
        let money_amounts = self.money_amounts.update(data, tx).await?;
        Ok(to_dtos(&money_amounts))
    }

    pub async fn delete(&self, ids: &[String], tx: Option<&T::Tx>) -> PricingResult<()> {
        self.money_amounts.delete(ids, tx).await?;
        Ok(())
    }

    // =========================================================================
    // Currencies
    // =========================================================================

    pub async fn retrieve_currency(
        &self,
        code: &str,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<CurrencyDto> {
        let currency = self.currencies.retrieve(code, config, tx).await?;
        Ok(CurrencyDto::from(&currency))
    }

    pub async fn list_currencies(
        &self,
        filter: &CurrencyFilter,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<CurrencyDto>> {
        let currencies = self.currencies.list(filter, config, tx).await?;
        Ok(to_dtos(&currencies))
    }

    pub async fn list_and_count_currencies(
        &self,
        filter: &CurrencyFilter,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<(Vec<CurrencyDto>, u64)> {
        let (currencies, count) = self.currencies.list_and_count(filter, config, tx).await?;
        Ok((to_dtos(&currencies), count))
    }

    pub async fn create_currencies(
        &self,
        data: Vec<CreateCurrency>,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<CurrencyDto>> {
        let currencies = self.currencies.create(data, tx).await?;
        Ok(to_dtos(&currencies))
    }

    pub async fn update_currencies(
        &self,
        data: Vec<UpdateCurrency>,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<CurrencyDto>> {
        let currencies = self.currencies.update(data, tx).await?;
        Ok(to_dtos(&currencies))
    }

    pub async fn delete_currencies(&self, codes: &[String], tx: Option<&T::Tx>) -> PricingResult<()> {
        self.currencies.delete(codes, tx).await?;
        Ok(())
    }

    // =========================================================================
    // Price Lists
    // =========================================================================

    pub async fn retrieve_price_list(
        &self,
        id: &str,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<PriceListDto> {
        let price_list = self.price_lists.retrieve(id, config, tx).await?;
        Ok(PriceListDto::from(&price_list))
    }

    pub async fn list_price_lists(
        &self,
        filter: &PriceListFilter,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<PriceListDto>> {
        let price_lists = self.price_lists.list(filter, config, tx).await?;
        Ok(to_dtos(&price_lists))
    }

    pub async fn list_and_count_price_lists(
        &self,
        filter: &PriceListFilter,
        config: &FindConfig,
        tx: Option<&T::Tx>,
    ) -> PricingResult<(Vec<PriceListDto>, u64)> {
        let (price_lists, count) = self.price_lists.list_and_count(filter, config, tx).await?;
        Ok((to_dtos(&price_lists), count))
    }

    /// Creates price lists together with their prices.
    ///
    /// Each returned list carries the prices created for it. A failure on
    /// any element leaves none of the batch behind.
    pub async fn create_price_lists(
        &self,
        data: Vec<CreatePriceListInput>,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<PriceListDto>> {
        const OPERATION: &str = "create_price_lists";

        let count = data.len();
        let scope = self.open(tx).await?;
        let result = self.create_price_lists_in(data, scope.tx()).await;
        let created = self
            .close(scope, result)
            .await
            .map_err(|source| PricingError::aborted(OPERATION, source))?;

        info!(count, "Price lists created");
        Ok(created)
    }

    /// Applies metadata changes and upserts prices for a batch of price
    /// lists.
    ///
    /// Prices with an id are patched (and moved to the list they were sent
    /// with); prices without one are created in that list. The returned
    /// lists do not carry prices.
    pub async fn update_price_lists(
        &self,
        data: Vec<UpdatePriceListInput>,
        tx: Option<&T::Tx>,
    ) -> PricingResult<Vec<PriceListDto>> {
        const OPERATION: &str = "update_price_lists";

        let plan = PriceListUpdatePlan::from_inputs(data);
        debug!(
            price_lists = plan.price_lists.len(),
            existing_prices = plan.existing_prices.len(),
            new_prices = plan.new_prices.len(),
            "Planned price list update"
        );

        let scope = self.open(tx).await?;
        let result = self.update_price_lists_in(plan, scope.tx()).await;
        let updated = self
            .close(scope, result)
            .await
            .map_err(|source| PricingError::aborted(OPERATION, source))?;

        info!(count = updated.len(), "Price lists updated");
        Ok(updated)
    }

    /// Deletes price lists and every price they own.
    pub async fn delete_price_lists(&self, ids: &[String], tx: Option<&T::Tx>) -> PricingResult<()> {
        const OPERATION: &str = "delete_price_lists";

        let scope = self.open(tx).await?;
        let result = self.price_lists.delete(ids, Some(scope.tx())).await;
        self.close(scope, result)
            .await
            .map_err(|source| PricingError::aborted(OPERATION, source))?;

        info!(count = ids.len(), "Price lists deleted");
        Ok(())
    }

    /// Marks price lists deleted and removes the prices they own.
    pub async fn soft_delete_price_lists(
        &self,
        ids: &[String],
        tx: Option<&T::Tx>,
    ) -> PricingResult<()> {
        const OPERATION: &str = "soft_delete_price_lists";

        let scope = self.open(tx).await?;
        let result = self.price_lists.soft_delete(ids, Some(scope.tx())).await;
        self.close(scope, result)
            .await
            .map_err(|source| PricingError::aborted(OPERATION, source))?;

        info!(count = ids.len(), "Price lists soft-deleted");
        Ok(())
    }

    // =========================================================================
    // Composite Steps
    // =========================================================================

    async fn create_price_lists_in(
        &self,
        data: Vec<CreatePriceListInput>,
        tx: &T::Tx,
    ) -> DbResult<Vec<PriceListDto>> {
        let mut created = Vec::with_capacity(data.len());

        for input in data {
            let (metadata, prices) = input.into_parts();

            let mut price_list = self
                .price_lists
                .create(vec![metadata], Some(tx))
                .await?
                .pop()
                .ok_or_else(|| DbError::Internal("price list create returned no row".into()))?;

            let prices = self
                .money_amounts
                .add_price_list_prices(&price_list.id, prices, Some(tx))
                .await?;

            debug!(
                price_list_id = %price_list.id,
                prices = prices.len(),
                "Created price list with prices"
            );
            price_list.prices = Some(prices);
            created.push(PriceListDto::from(&price_list));
        }

        Ok(created)
    }

    async fn update_price_lists_in(
        &self,
        plan: PriceListUpdatePlan,
        tx: &T::Tx,
    ) -> DbResult<Vec<PriceListDto>> {
        let PriceListUpdatePlan {
            price_lists,
            existing_prices,
            new_prices,
        } = plan;

        let updated = self.price_lists.update(price_lists, Some(tx)).await?;

        tokio::try_join!(
            self.money_amounts.update(existing_prices, Some(tx)),
            self.money_amounts.create(new_prices, Some(tx)),
        )?;

        Ok(to_dtos(&updated))
    }

    // =========================================================================
    // Scope Handling
    // =========================================================================

    async fn open<'a>(
        &self,
        tx: Option<&'a T::Tx>,
    ) -> DbResult<Scope<'a, T::Tx, T::Savepoint>> {
        match tx {
            Some(tx) => {
                let savepoint = self.transactions.savepoint(tx).await?;
                Ok(Scope::Caller { tx, savepoint })
            }
            None => Ok(Scope::Owned(self.transactions.begin().await?)),
        }
    }

    /// On success commits an owned scope or releases a caller's savepoint.
    /// On failure rolls back every write the operation made.
    async fn close<R>(
        &self,
        scope: Scope<'_, T::Tx, T::Savepoint>,
        result: DbResult<R>,
    ) -> DbResult<R> {
        match (scope, result) {
            (Scope::Owned(tx), Ok(value)) => {
                self.transactions.commit(tx).await?;
                Ok(value)
            }
            (Scope::Owned(tx), Err(err)) => {
                if let Err(rollback_err) = self.transactions.rollback(tx).await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
            (Scope::Caller { tx, savepoint }, Ok(value)) => {
                self.transactions.release_savepoint(tx, savepoint).await?;
                Ok(value)
            }
            (Scope::Caller { tx, savepoint }, Err(err)) => {
                if let Err(rollback_err) = self.transactions.rollback_to_savepoint(tx, savepoint).await
                {
                    warn!(error = %rollback_err, "Rollback to savepoint failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing_core::{
        CreatePriceList, ErrorKind, Money, PriceListPriceInput, PriceListStatus, Relation,
        UpdatePriceList,
    };
    use pricing_db::DbConfig;

    async fn setup() -> SqlitePricingService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = SqlitePricingService::from_database(db);
        service
            .create_currencies(
                vec![
                    CreateCurrency::new("usd", "US Dollar", "$"),
                    CreateCurrency::new("eur", "Euro", "€"),
                ],
                None,
            )
            .await
            .unwrap();
        service
    }

    async fn summer_sale(service: &SqlitePricingService) -> PriceListDto {
        service
            .create_price_lists(
                vec![CreatePriceListInput::new(CreatePriceList::new("Summer Sale"))
                    .with_price(CreateMoneyAmount::new("usd", 1000))],
                None,
            )
            .await
            .unwrap()
            .remove(0)
    }

    async fn price_list_count(service: &SqlitePricingService) -> u64 {
        service
            .list_and_count_price_lists(&PriceListFilter::default(), &FindConfig::new(), None)
            .await
            .unwrap()
            .1
    }

    async fn money_amount_count(service: &SqlitePricingService) -> u64 {
        service
            .list_and_count(&MoneyAmountFilter::default(), &FindConfig::new(), None)
            .await
            .unwrap()
            .1
    }

    /// (id, currency, amount) of a list's prices in insertion order.
    async fn prices_of(
        service: &SqlitePricingService,
        list_id: &str,
    ) -> Vec<(String, String, Option<i64>)> {
        service
            .list(
                &MoneyAmountFilter::price_list_ids([list_id]),
                &FindConfig::new(),
                None,
            )
            .await
            .unwrap()
            .into_iter()
            .map(|p| {
                (
                    p.id,
                    p.currency_code.unwrap_or_default(),
                    p.amount.map(|a| a.minor()),
                )
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Money amounts
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_then_retrieve_each_id() {
        let service = setup().await;

        let created = service
            .create(
                vec![
                    CreateMoneyAmount::new("usd", 1000),
                    CreateMoneyAmount::new("eur", 900).tier(Some(10), Some(99)),
                ],
                None,
            )
            .await
            .unwrap();
        assert_eq!(created.len(), 2);

        for dto in &created {
            let found = service.retrieve(&dto.id, &FindConfig::new(), None).await.unwrap();
            assert_eq!(&found, dto);
        }
    }

    #[tokio::test]
    async fn test_retrieve_with_currency_relation() {
        let service = setup().await;
        let created = service
            .create(vec![CreateMoneyAmount::new("eur", 500)], None)
            .await
            .unwrap();

        let config = FindConfig::new().with_relation(Relation::Currency);
        let dto = service.retrieve(&created[0].id, &config, None).await.unwrap();

        assert_eq!(dto.currency.unwrap().symbol, "€");
    }

    #[tokio::test]
    async fn test_retrieve_unknown_is_not_found_without_side_effects() {
        let service = setup().await;
        summer_sale(&service).await;
        let before = money_amount_count(&service).await;

        let err = service
            .retrieve("ma_unknown", &FindConfig::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, PricingError::Store(DbError::NotFound { .. })));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(money_amount_count(&service).await, before);
    }

    #[tokio::test]
    async fn test_money_amount_update_is_idempotent() {
        let service = setup().await;
        let created = service
            .create(vec![CreateMoneyAmount::new("usd", 1000)], None)
            .await
            .unwrap();
        let patch = UpdateMoneyAmount::new(created[0].id.clone()).amount(1500);

        let first = service.update(vec![patch.clone()], None).await.unwrap();
        let second = service.update(vec![patch], None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second[0].amount, Some(Money::from_minor(1500)));
    }

    #[tokio::test]
    async fn test_create_is_not_idempotent() {
        let service = setup().await;
        let data = vec![CreateMoneyAmount::new("usd", 1000)];

        let first = service.create(data.clone(), None).await.unwrap();
        let second = service.create(data, None).await.unwrap();

        assert_ne!(first[0].id, second[0].id);
        assert_eq!(money_amount_count(&service).await, 2);
    }

    #[tokio::test]
    async fn test_store_errors_surface_unchanged() {
        let service = setup().await;

        let err = service
            .create(vec![CreateMoneyAmount::new("xxx", 100)], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialViolation);

        let err = service
            .create(vec![CreateMoneyAmount::new("usd", -1)], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    // -------------------------------------------------------------------------
    // Currencies
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_currency_delegation() {
        let service = setup().await;

        let (currencies, count) = service
            .list_and_count_currencies(&CurrencyFilter::default(), &FindConfig::new(), None)
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(currencies[0].code, "usd");

        let err = service
            .create_currencies(vec![CreateCurrency::new("usd", "Again", "$")], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);

        service
            .create(vec![CreateMoneyAmount::new("eur", 100)], None)
            .await
            .unwrap();
        let err = service
            .delete_currencies(&["eur".to_string()], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialViolation);

        service
            .delete_currencies(&["usd".to_string()], None)
            .await
            .unwrap();
        let err = service
            .retrieve_currency("usd", &FindConfig::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    // -------------------------------------------------------------------------
    // Price lists
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_price_list_with_price() {
        let service = setup().await;

        let dto = summer_sale(&service).await;

        assert_eq!(dto.name, "Summer Sale");
        let prices = dto.prices.as_ref().unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].currency_code.as_deref(), Some("usd"));
        assert_eq!(prices[0].amount, Some(Money::from_minor(1000)));
        assert_eq!(prices[0].price_list_id.as_deref(), Some(dto.id.as_str()));

        let config = FindConfig::new().with_relation(Relation::PricesCurrency);
        let stored = service.retrieve_price_list(&dto.id, &config, None).await.unwrap();
        let stored_prices = stored.prices.unwrap();
        assert_eq!(stored_prices[0].id, prices[0].id);
        assert_eq!(stored_prices[0].currency.as_ref().unwrap().code, "usd");
    }

    #[tokio::test]
    async fn test_create_price_lists_is_all_or_nothing() {
        let service = setup().await;

        let err = service
            .create_price_lists(
                vec![
                    CreatePriceListInput::new(CreatePriceList::new("Good"))
                        .with_price(CreateMoneyAmount::new("usd", 100)),
                    CreatePriceListInput::new(CreatePriceList::new("Bad"))
                        .with_price(CreateMoneyAmount::new("xxx", 100)),
                ],
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PricingError::TransactionAborted { operation: "create_price_lists", .. }
        ));
        assert_eq!(err.root_kind(), ErrorKind::ReferentialViolation);
        assert_eq!(price_list_count(&service).await, 0);
        assert_eq!(money_amount_count(&service).await, 0);
    }

    #[tokio::test]
    async fn test_update_price_lists_partitions_prices() {
        let service = setup().await;
        let list = summer_sale(&service).await;
        let existing_id = list.prices.as_ref().unwrap()[0].id.clone();

        let mut input = UpdatePriceListInput::new(list.id.clone())
            .with_price(PriceListPriceInput::existing(existing_id.clone(), 1200))
            .with_price(PriceListPriceInput::new("eur", 500));
        input.price_list.status = Some(PriceListStatus::Active);

        let updated = service.update_price_lists(vec![input], None).await.unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status, PriceListStatus::Active);
        assert!(updated[0].prices.is_none());

        let prices = service
            .list(
                &MoneyAmountFilter::price_list_ids([list.id.as_str()]),
                &FindConfig::new(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].id, existing_id);
        assert_eq!(prices[0].amount, Some(Money::from_minor(1200)));
        assert_eq!(prices[1].currency_code.as_deref(), Some("eur"));
        assert_eq!(prices[1].amount, Some(Money::from_minor(500)));
        assert_eq!(prices[1].price_list_id.as_deref(), Some(list.id.as_str()));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_everything_unchanged() {
        let service = setup().await;
        let list = summer_sale(&service).await;
        let existing_id = list.prices.as_ref().unwrap()[0].id.clone();
        let before = service
            .list_and_count(&MoneyAmountFilter::default(), &FindConfig::new(), None)
            .await
            .unwrap();

        let mut input = UpdatePriceListInput::new(list.id.clone())
            .with_price(PriceListPriceInput::existing(existing_id, 1200))
            .with_price(PriceListPriceInput::new("xxx", 500));
        input.price_list.name = Some("Renamed".into());

        let err = service.update_price_lists(vec![input], None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransactionAborted);
        assert_eq!(err.root_kind(), ErrorKind::ReferentialViolation);

        let after = service
            .list_and_count(&MoneyAmountFilter::default(), &FindConfig::new(), None)
            .await
            .unwrap();
        assert_eq!(after, before);

        let stored = service
            .retrieve_price_list(&list.id, &FindConfig::new(), None)
            .await
            .unwrap();
        assert_eq!(stored.name, "Summer Sale");
    }

    #[tokio::test]
    async fn test_update_unknown_price_list_aborts() {
        let service = setup().await;

        let err = service
            .update_price_lists(vec![UpdatePriceListInput::new("pl_missing")], None)
            .await
            .unwrap_err();

        assert_eq!(err.root_kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_price_lists_metadata_is_idempotent() {
        let service = setup().await;
        let list = summer_sale(&service).await;

        let mut input = UpdatePriceListInput::new(list.id.clone());
        input.price_list = UpdatePriceList {
            description: Some("Hot deals".into()),
            ..UpdatePriceList::new(list.id.clone())
        };

        let first = service
            .update_price_lists(vec![input.clone()], None)
            .await
            .unwrap();
        let second = service.update_price_lists(vec![input], None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second[0].description, "Hot deals");
    }

    #[tokio::test]
    async fn test_delete_price_list_cascades_to_prices() {
        let service = setup().await;
        let list = summer_sale(&service).await;
        let price_id = list.prices.as_ref().unwrap()[0].id.clone();

        service
            .delete_price_lists(&[list.id.clone()], None)
            .await
            .unwrap();

        let err = service
            .retrieve_price_list(&list.id, &FindConfig::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = service
            .retrieve(&price_id, &FindConfig::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_with_unknown_id_keeps_batch() {
        let service = setup().await;
        let list = summer_sale(&service).await;

        let err = service
            .delete_price_lists(&[list.id.clone(), "pl_missing".to_string()], None)
            .await
            .unwrap_err();

        assert_eq!(err.root_kind(), ErrorKind::NotFound);
        assert_eq!(price_list_count(&service).await, 1);
        assert_eq!(money_amount_count(&service).await, 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_list_and_removes_prices() {
        let service = setup().await;
        let list = summer_sale(&service).await;

        service
            .soft_delete_price_lists(&[list.id.clone()], None)
            .await
            .unwrap();

        assert_eq!(price_list_count(&service).await, 0);
        assert_eq!(money_amount_count(&service).await, 0);

        let err = service
            .soft_delete_price_lists(&[list.id.clone()], None)
            .await
            .unwrap_err();
        assert_eq!(err.root_kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_price_lists_spanning_two_lists() {
        let service = setup().await;
        let summer = summer_sale(&service).await;
        let winter = service
            .create_price_lists(
                vec![CreatePriceListInput::new(CreatePriceList::new("Winter Sale"))
                    .with_price(CreateMoneyAmount::new("eur", 800))],
                None,
            )
            .await
            .unwrap()
            .remove(0);
        let summer_price = summer.prices.as_ref().unwrap()[0].id.clone();
        let winter_price = winter.prices.as_ref().unwrap()[0].id.clone();

        service
            .update_price_lists(
                vec![
                    UpdatePriceListInput::new(summer.id.clone())
                        .with_price(PriceListPriceInput::existing(summer_price.clone(), 1100))
                        .with_price(PriceListPriceInput::new("eur", 900)),
                    UpdatePriceListInput::new(winter.id.clone())
                        .with_price(PriceListPriceInput::existing(winter_price.clone(), 750))
                        .with_price(PriceListPriceInput::new("usd", 600)),
                ],
                None,
            )
            .await
            .unwrap();

        let summer_prices = prices_of(&service, &summer.id).await;
        assert_eq!(summer_prices.len(), 2);
        assert_eq!(summer_prices[0], (summer_price, "usd".to_string(), Some(1100)));
        assert_eq!((summer_prices[1].1.as_str(), summer_prices[1].2), ("eur", Some(900)));

        let winter_prices = prices_of(&service, &winter.id).await;
        assert_eq!(winter_prices.len(), 2);
        assert_eq!(winter_prices[0], (winter_price, "eur".to_string(), Some(750)));
        assert_eq!((winter_prices[1].1.as_str(), winter_prices[1].2), ("usd", Some(600)));

        assert_eq!(money_amount_count(&service).await, 4);
    }

    #[tokio::test]
    async fn test_invalid_tier_aborts_whole_create_batch() {
        let service = setup().await;

        let err = service
            .create_price_lists(
                vec![
                    CreatePriceListInput::new(CreatePriceList::new("Good"))
                        .with_price(CreateMoneyAmount::new("usd", 100)),
                    CreatePriceListInput::new(CreatePriceList::new("Bad"))
                        .with_price(CreateMoneyAmount::new("usd", 100).tier(Some(5), Some(1))),
                ],
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransactionAborted);
        assert_eq!(err.root_kind(), ErrorKind::ValidationFailed);
        assert_eq!(price_list_count(&service).await, 0);
        assert_eq!(money_amount_count(&service).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_tier_aborts_whole_update_batch() {
        let service = setup().await;
        let list = summer_sale(&service).await;

        let mut input = UpdatePriceListInput::new(list.id.clone()).with_price(
            PriceListPriceInput {
                min_quantity: Some(Some(5)),
                max_quantity: Some(Some(1)),
                ..PriceListPriceInput::new("eur", 500)
            },
        );
        input.price_list.name = Some("Renamed".into());

        let err = service.update_price_lists(vec![input], None).await.unwrap_err();

        assert_eq!(err.root_kind(), ErrorKind::ValidationFailed);
        assert_eq!(price_list_count(&service).await, 1);
        assert_eq!(money_amount_count(&service).await, 1);
        let stored = service
            .retrieve_price_list(&list.id, &FindConfig::new(), None)
            .await
            .unwrap();
        assert_eq!(stored.name, "Summer Sale");
    }

    // -------------------------------------------------------------------------
    // Caller-supplied transactions
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_caller_transaction_rollback_discards_composite() {
        let service = setup().await;

        let tx = service.transactions().begin().await.unwrap();
        let created = service
            .create_price_lists(
                vec![CreatePriceListInput::new(CreatePriceList::new("Draft"))
                    .with_price(CreateMoneyAmount::new("usd", 100))],
                Some(&tx),
            )
            .await
            .unwrap();
        let seen = service
            .retrieve_price_list(&created[0].id, &FindConfig::new(), Some(&tx))
            .await
            .unwrap();
        assert_eq!(seen.name, "Draft");
        service.transactions().rollback(tx).await.unwrap();

        assert_eq!(price_list_count(&service).await, 0);
        assert_eq!(money_amount_count(&service).await, 0);
    }

    #[tokio::test]
    async fn test_caller_transaction_spans_calls() {
        let service = setup().await;

        let tx = service.transactions().begin().await.unwrap();
        let created = service
            .create_price_lists(
                vec![CreatePriceListInput::new(CreatePriceList::new("Winter"))],
                Some(&tx),
            )
            .await
            .unwrap();
        service
            .update_price_lists(
                vec![UpdatePriceListInput::new(created[0].id.clone())
                    .with_price(PriceListPriceInput::new("eur", 700))],
                Some(&tx),
            )
            .await
            .unwrap();
        service.transactions().commit(tx).await.unwrap();

        let stored = service
            .retrieve_price_list(
                &created[0].id,
                &FindConfig::new().with_relation(Relation::Prices),
                None,
            )
            .await
            .unwrap();
        assert_eq!(stored.prices.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_update_in_caller_transaction_leaves_no_writes() {
        let service = setup().await;
        let list = summer_sale(&service).await;

        let tx = service.transactions().begin().await.unwrap();
        service
            .create_currencies(vec![CreateCurrency::new("gbp", "British Pound", "£")], Some(&tx))
            .await
            .unwrap();

        let mut input = UpdatePriceListInput::new(list.id.clone())
            .with_price(PriceListPriceInput::new("xxx", 500));
        input.price_list.name = Some("Renamed".into());
        let err = service
            .update_price_lists(vec![input], Some(&tx))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionAborted);

        service.transactions().commit(tx).await.unwrap();

        let stored = service
            .retrieve_price_list(&list.id, &FindConfig::new(), None)
            .await
            .unwrap();
        assert_eq!(stored.name, "Summer Sale");
        assert_eq!(money_amount_count(&service).await, 1);
        // writes made before the failed operation are kept
        service
            .retrieve_currency("gbp", &FindConfig::new(), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_create_in_caller_transaction_leaves_no_writes() {
        let service = setup().await;

        let tx = service.transactions().begin().await.unwrap();
        let err = service
            .create_price_lists(
                vec![
                    CreatePriceListInput::new(CreatePriceList::new("Good"))
                        .with_price(CreateMoneyAmount::new("usd", 100)),
                    CreatePriceListInput::new(CreatePriceList::new("Bad"))
                        .with_price(CreateMoneyAmount::new("xxx", 100)),
                ],
                Some(&tx),
            )
            .await
            .unwrap_err();
        assert_eq!(err.root_kind(), ErrorKind::ReferentialViolation);

        let kept = service
            .create_price_lists(
                vec![CreatePriceListInput::new(CreatePriceList::new("Kept"))],
                Some(&tx),
            )
            .await
            .unwrap();
        service.transactions().commit(tx).await.unwrap();

        let (lists, count) = service
            .list_and_count_price_lists(&PriceListFilter::default(), &FindConfig::new(), None)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(lists[0].id, kept[0].id);
        assert_eq!(money_amount_count(&service).await, 0);
    }
}
