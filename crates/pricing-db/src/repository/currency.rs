//! # Currency Repository
//!
//! Database operations for currencies.
//!
//! Currencies are keyed by their code and referenced (never owned) by
//! money amounts, so deleting one that is still in use is refused.

use std::collections::HashSet;

use pricing_core::validation::validate_currency;
use pricing_core::{
    CreateCurrency, Currency, CurrencyFilter, FindConfig, UpdateCurrency,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{dedup, existing_keys, first_missing, push_in, push_order_and_page, push_search};
use crate::error::{DbError, DbResult};
use crate::store::CurrencyStore;
use crate::transaction::{Conn, SqliteTransaction};

const ENTITY: &str = "Currency";

const COLUMNS: &str = "code, name, symbol, decimal_digits";

/// Columns a currency list may be ordered by.
pub const CURRENCY_ORDER_FIELDS: &[&str] = &["code", "name", "symbol", "decimal_digits"];

/// Repository for currency database operations.
#[derive(Debug, Clone)]
pub struct CurrencyRepository {
    pool: SqlitePool,
}

impl CurrencyRepository {
    /// Creates a new CurrencyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CurrencyRepository { pool }
    }
}

impl CurrencyStore<SqliteTransaction> for CurrencyRepository {
    async fn retrieve(
        &self,
        code: &str,
        _config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Currency> {
        debug!(code = %code, "Retrieving currency");

        let mut conn = Conn::read(&self.pool, tx).await?;
        fetch_by_codes(&mut conn, &[code.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, code))
    }

    async fn list(
        &self,
        filter: &CurrencyFilter,
        config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<Currency>> {
        let mut conn = Conn::read(&self.pool, tx).await?;
        let currencies = select(&mut conn, filter, config).await?;

        debug!(count = currencies.len(), "Listed currencies");
        Ok(currencies)
    }

    async fn list_and_count(
        &self,
        filter: &CurrencyFilter,
        config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<(Vec<Currency>, u64)> {
        // Page and total from one snapshot
        let mut conn = Conn::write(&self.pool, tx).await?;
        let currencies = select(&mut conn, filter, config).await?;
        let total = count(&mut conn, filter).await?;
        conn.finish().await?;

        debug!(count = currencies.len(), total, "Listed and counted currencies");
        Ok((currencies, total))
    }

    async fn create(
        &self,
        data: Vec<CreateCurrency>,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<Currency>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let currencies: Vec<Currency> = data.into_iter().map(CreateCurrency::into_currency).collect();

        let mut seen = HashSet::new();
        for currency in &currencies {
            validate_currency(currency)?;
            if !seen.insert(currency.code.as_str()) {
                return Err(DbError::duplicate("code", &currency.code));
            }
        }

        let mut conn = Conn::write(&self.pool, tx).await?;

        let codes: Vec<String> = currencies.iter().map(|c| c.code.clone()).collect();
        let taken = existing_keys(&mut conn, "currency", "code", &codes, "").await?;
        if let Some(code) = codes.iter().find(|code| taken.contains(*code)) {
            return Err(DbError::duplicate("code", code));
        }

        for currency in &currencies {
            sqlx::query(
                "INSERT INTO currency (code, name, symbol, decimal_digits) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&currency.code)
            .bind(&currency.name)
            .bind(&currency.symbol)
            .bind(currency.decimal_digits)
            .execute(&mut *conn)
            .await?;
        }

        conn.finish().await?;

        debug!(count = currencies.len(), "Created currencies");
        Ok(currencies)
    }

    async fn update(
        &self,
        data: Vec<UpdateCurrency>,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<Currency>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Conn::write(&self.pool, tx).await?;
        let mut updated = Vec::with_capacity(data.len());

        for patch in &data {
            let existing = fetch_by_codes(&mut conn, std::slice::from_ref(&patch.code))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| DbError::not_found(ENTITY, &patch.code))?;

            let merged = patch.apply_to(&existing);
            validate_currency(&merged)?;

            sqlx::query(
                "UPDATE currency SET name = ?1, symbol = ?2, decimal_digits = ?3 WHERE code = ?4",
            )
            .bind(&merged.name)
            .bind(&merged.symbol)
            .bind(merged.decimal_digits)
            .bind(&merged.code)
            .execute(&mut *conn)
            .await?;

            updated.push(merged);
        }

        conn.finish().await?;

        debug!(count = updated.len(), "Updated currencies");
        Ok(updated)
    }

    async fn delete(&self, codes: &[String], tx: Option<&SqliteTransaction>) -> DbResult<()> {
        if codes.is_empty() {
            return Ok(());
        }

        let codes = dedup(codes.iter().cloned());
        let mut conn = Conn::write(&self.pool, tx).await?;

        let existing = existing_keys(&mut conn, "currency", "code", &codes, "").await?;
        if let Some(code) = first_missing(&codes, &existing) {
            return Err(DbError::not_found(ENTITY, code));
        }

        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT currency_code FROM money_amount WHERE 1=1");
        push_in(&mut builder, "currency_code", &codes);
        builder.push(" LIMIT 1");
        let in_use: Option<String> = builder
            .build_query_scalar::<String>()
            .fetch_optional(&mut *conn)
            .await?;
        if let Some(code) = in_use {
            return Err(DbError::dangling(ENTITY, code));
        }

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM currency WHERE 1=1");
        push_in(&mut builder, "code", &codes);
        builder.build().execute(&mut *conn).await?;

        conn.finish().await?;

        debug!(count = codes.len(), "Deleted currencies");
        Ok(())
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Loads currencies by code, in no particular order.
pub(crate) async fn fetch_by_codes(
    conn: &mut SqliteConnection,
    codes: &[String],
) -> DbResult<Vec<Currency>> {
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM currency WHERE 1=1"));
    push_in(&mut builder, "code", codes);

    Ok(builder.build_query_as::<Currency>().fetch_all(&mut *conn).await?)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &CurrencyFilter) {
    if let Some(codes) = &filter.codes {
        push_in(builder, "code", codes);
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        push_search(builder, &["code", "name"], q);
    }
}

async fn select(
    conn: &mut SqliteConnection,
    filter: &CurrencyFilter,
    config: &FindConfig,
) -> DbResult<Vec<Currency>> {
    let (column, direction) = config.resolve_order(CURRENCY_ORDER_FIELDS, "code")?;

    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM currency WHERE 1=1"));
    push_filter(&mut builder, filter);
    push_order_and_page(&mut builder, column, direction, config);

    Ok(builder.build_query_as::<Currency>().fetch_all(&mut *conn).await?)
}

async fn count(conn: &mut SqliteConnection, filter: &CurrencyFilter) -> DbResult<u64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM currency WHERE 1=1");
    push_filter(&mut builder, filter);

    let total: i64 = builder.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
    Ok(total as u64)
}

// =============================================================================
// Unit Tests
// =============================================================================
