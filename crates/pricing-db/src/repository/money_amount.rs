//! # Money Amount Repository
//!
//! Database operations for money amounts (prices).
//!
//! ## Reference Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create / update / add_price_list_prices                               │
//! │                                                                         │
//! │  1. Build the stored record (new id, or fetched row + patch)           │
//! │  2. validate_money_amount   → amount >= 0, min <= max                  │
//! │  3. currency_code exists?   → else ReferentialViolation(Currency)      │
//! │  4. price_list_id live?     → else ReferentialViolation(PriceList)     │
//! │  5. INSERT / UPDATE                                                    │
//! │                                                                         │
//! │  Any failure aborts the batch; nothing from it is kept.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use pricing_core::id::{generate_entity_id, MONEY_AMOUNT_ID_PREFIX};
use pricing_core::validation::validate_money_amount;
use pricing_core::{
    CreateMoneyAmount, FindConfig, MoneyAmount, MoneyAmountFilter, Relation, UpdateMoneyAmount,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::currency::fetch_by_codes;
use super::{dedup, existing_keys, first_missing, push_in, push_order_and_page};
use crate::error::{DbError, DbResult};
use crate::store::MoneyAmountStore;
use crate::transaction::{Conn, SqliteTransaction};

const ENTITY: &str = "MoneyAmount";

const COLUMNS: &str = "id, currency_code, amount, min_quantity, max_quantity, price_list_id";

/// Columns a money amount list may be ordered by.
pub const MONEY_AMOUNT_ORDER_FIELDS: &[&str] = &[
    "id",
    "currency_code",
    "amount",
    "min_quantity",
    "max_quantity",
    "price_list_id",
];

/// Repository for money amount database operations.
#[derive(Debug, Clone)]
pub struct MoneyAmountRepository {
    pool: SqlitePool,
}

impl MoneyAmountRepository {
    /// Creates a new MoneyAmountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MoneyAmountRepository { pool }
    }
}

impl MoneyAmountStore<SqliteTransaction> for MoneyAmountRepository {
    async fn retrieve(
        &self,
        id: &str,
        config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<MoneyAmount> {
        debug!(id = %id, "Retrieving money amount");

        let mut conn = Conn::read(&self.pool, tx).await?;
        let mut money_amount = fetch_one(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found(ENTITY, id))?;

        if config.includes(Relation::Currency) {
            attach_currencies(&mut conn, std::slice::from_mut(&mut money_amount)).await?;
        }

        Ok(money_amount)
    }

    async fn list(
        &self,
        filter: &MoneyAmountFilter,
        config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<MoneyAmount>> {
        let mut conn = Conn::read(&self.pool, tx).await?;
        let money_amounts = select(&mut conn, filter, config).await?;

        debug!(count = money_amounts.len(), "Listed money amounts");
        Ok(money_amounts)
    }

    async fn list_and_count(
        &self,
        filter: &MoneyAmountFilter,
        config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<(Vec<MoneyAmount>, u64)> {
        let mut conn = Conn::write(&self.pool, tx).await?;
        let money_amounts = select(&mut conn, filter, config).await?;
        let total = count(&mut conn, filter).await?;
        conn.finish().await?;

        debug!(count = money_amounts.len(), total, "Listed and counted money amounts");
        Ok((money_amounts, total))
    }

    async fn create(
        &self,
        data: Vec<CreateMoneyAmount>,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<MoneyAmount>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let records = build_records(data)?;

        let mut conn = Conn::write(&self.pool, tx).await?;
        check_references(&mut conn, &records).await?;
        insert_all(&mut conn, &records).await?;
        conn.finish().await?;

        debug!(count = records.len(), "Created money amounts");
        Ok(records)
    }

    async fn update(
        &self,
        data: Vec<UpdateMoneyAmount>,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<MoneyAmount>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Conn::write(&self.pool, tx).await?;
        let mut updated = Vec::with_capacity(data.len());

        for patch in &data {
            let existing = fetch_one(&mut conn, &patch.id)
                .await?
                .ok_or_else(|| DbError::not_found(ENTITY, &patch.id))?;

            let merged = patch.apply_to(&existing);
            validate_money_amount(&merged)?;
            check_references(&mut conn, std::slice::from_ref(&merged)).await?;

            sqlx::query(
                r#"
                UPDATE money_amount
                SET currency_code = ?1,
                    amount = ?2,
                    min_quantity = ?3,
                    max_quantity = ?4,
                    price_list_id = ?5
                WHERE id = ?6
                "#,
            )
            .bind(&merged.currency_code)
            .bind(merged.amount)
            .bind(merged.min_quantity)
            .bind(merged.max_quantity)
            .bind(&merged.price_list_id)
            .bind(&merged.id)
            .execute(&mut *conn)
            .await?;

            updated.push(merged);
        }

        conn.finish().await?;

        debug!(count = updated.len(), "Updated money amounts");
        Ok(updated)
    }

    async fn delete(&self, ids: &[String], tx: Option<&SqliteTransaction>) -> DbResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let ids = dedup(ids.iter().cloned());
        let mut conn = Conn::write(&self.pool, tx).await?;

        let existing = existing_keys(&mut conn, "money_amount", "id", &ids, "").await?;
        if let Some(id) = first_missing(&ids, &existing) {
            return Err(DbError::not_found(ENTITY, id));
        }

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM money_amount WHERE 1=1");
        push_in(&mut builder, "id", &ids);
        builder.build().execute(&mut *conn).await?;

        conn.finish().await?;

        debug!(count = ids.len(), "Deleted money amounts");
        Ok(())
    }

    async fn add_price_list_prices(
        &self,
        price_list_id: &str,
        data: Vec<CreateMoneyAmount>,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<MoneyAmount>> {
        let owner = price_list_id.to_string();
        let records = build_records(
            data.into_iter()
                .map(|price| CreateMoneyAmount {
                    price_list_id: Some(owner.clone()),
                    ..price
                })
                .collect(),
        )?;

        let mut conn = Conn::write(&self.pool, tx).await?;

        let live = existing_keys(
            &mut conn,
            "price_list",
            "id",
            std::slice::from_ref(&owner),
            " AND deleted_at IS NULL",
        )
        .await?;
        if live.is_empty() {
            return Err(DbError::not_found("PriceList", owner));
        }

        check_references(&mut conn, &records).await?;
        insert_all(&mut conn, &records).await?;
        conn.finish().await?;

        debug!(
            price_list_id = %price_list_id,
            count = records.len(),
            "Added price list prices"
        );
        Ok(records)
    }
}

// =============================================================================
// Writes
// =============================================================================

/// Mints ids and validates every record before anything touches the
/// database.
fn build_records(data: Vec<CreateMoneyAmount>) -> DbResult<Vec<MoneyAmount>> {
    let records: Vec<MoneyAmount> = data
        .into_iter()
        .map(|payload| payload.into_money_amount(generate_entity_id(MONEY_AMOUNT_ID_PREFIX)))
        .collect();

    for record in &records {
        validate_money_amount(record)?;
    }

    Ok(records)
}

/// Fails on the first currency or price list reference that doesn't
/// resolve. Soft-deleted price lists don't resolve.
async fn check_references(conn: &mut SqliteConnection, records: &[MoneyAmount]) -> DbResult<()> {
    let codes = dedup(records.iter().filter_map(|r| r.currency_code.clone()));
    let known = existing_keys(conn, "currency", "code", &codes, "").await?;
    if let Some(code) = first_missing(&codes, &known) {
        return Err(DbError::dangling("Currency", code));
    }

    let lists = dedup(records.iter().filter_map(|r| r.price_list_id.clone()));
    let live = existing_keys(conn, "price_list", "id", &lists, " AND deleted_at IS NULL").await?;
    if let Some(id) = first_missing(&lists, &live) {
        return Err(DbError::dangling("PriceList", id));
    }

    Ok(())
}

async fn insert_all(conn: &mut SqliteConnection, records: &[MoneyAmount]) -> DbResult<()> {
    for record in records {
        sqlx::query(
            r#"
            INSERT INTO money_amount (id, currency_code, amount, min_quantity, max_quantity, price_list_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.currency_code)
        .bind(record.amount)
        .bind(record.min_quantity)
        .bind(record.max_quantity)
        .bind(&record.price_list_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Reads
// =============================================================================

async fn fetch_one(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<MoneyAmount>> {
    let sql = format!("SELECT {COLUMNS} FROM money_amount WHERE id = ?1");
    Ok(sqlx::query_as::<_, MoneyAmount>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Populates `currency` on each record that references one.
pub(crate) async fn attach_currencies(
    conn: &mut SqliteConnection,
    money_amounts: &mut [MoneyAmount],
) -> DbResult<()> {
    let codes = dedup(money_amounts.iter().filter_map(|m| m.currency_code.clone()));
    let currencies: HashMap<String, _> = fetch_by_codes(conn, &codes)
        .await?
        .into_iter()
        .map(|currency| (currency.code.clone(), currency))
        .collect();

    for money_amount in money_amounts.iter_mut() {
        money_amount.currency = money_amount
            .currency_code
            .as_ref()
            .and_then(|code| currencies.get(code).cloned());
    }

    Ok(())
}

/// Loads the prices of the given price lists, grouped by list id.
pub(crate) async fn fetch_for_price_lists(
    conn: &mut SqliteConnection,
    price_list_ids: &[String],
    with_currency: bool,
) -> DbResult<HashMap<String, Vec<MoneyAmount>>> {
    if price_list_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM money_amount WHERE 1=1"));
    push_in(&mut builder, "price_list_id", price_list_ids);
    builder.push(" ORDER BY rowid ASC");

    let mut prices = builder
        .build_query_as::<MoneyAmount>()
        .fetch_all(&mut *conn)
        .await?;

    if with_currency {
        attach_currencies(conn, &mut prices).await?;
    }

    let mut grouped: HashMap<String, Vec<MoneyAmount>> = HashMap::new();
    for price in prices {
        if let Some(owner) = price.price_list_id.clone() {
            grouped.entry(owner).or_default().push(price);
        }
    }

    Ok(grouped)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &MoneyAmountFilter) {
    if let Some(ids) = &filter.ids {
        push_in(builder, "id", ids);
    }
    if let Some(codes) = &filter.currency_codes {
        push_in(builder, "currency_code", codes);
    }
    if let Some(lists) = &filter.price_list_ids {
        push_in(builder, "price_list_id", lists);
    }
    if filter.standalone_only {
        builder.push(" AND price_list_id IS NULL");
    }
    if let Some(quantity) = filter.quantity {
        builder
            .push(" AND (min_quantity IS NULL OR min_quantity <= ")
            .push_bind(quantity)
            .push(") AND (max_quantity IS NULL OR max_quantity >= ")
            .push_bind(quantity)
            .push(")");
    }
}

async fn select(
    conn: &mut SqliteConnection,
    filter: &MoneyAmountFilter,
    config: &FindConfig,
) -> DbResult<Vec<MoneyAmount>> {
    let (column, direction) = config.resolve_order(MONEY_AMOUNT_ORDER_FIELDS, "rowid")?;

    let mut builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM money_amount WHERE 1=1"));
    push_filter(&mut builder, filter);
    push_order_and_page(&mut builder, column, direction, config);

    let mut money_amounts = builder
        .build_query_as::<MoneyAmount>()
        .fetch_all(&mut *conn)
        .await?;

    if config.includes(Relation::Currency) {
        attach_currencies(conn, &mut money_amounts).await?;
    }

    Ok(money_amounts)
}

async fn count(conn: &mut SqliteConnection, filter: &MoneyAmountFilter) -> DbResult<u64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM money_amount WHERE 1=1");
    push_filter(&mut builder, filter);

    let total: i64 = builder.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
    Ok(total as u64)
}

// =============================================================================
// Unit Tests
// =============================================================================
