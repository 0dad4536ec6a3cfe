//! # Repository Module
//!
//! SQLite implementations of the store traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  PricingService                                                        │
//! │       │                                                                 │
//! │       │  money_amounts.create(batch, Some(&tx))                        │
//! │       ▼                                                                 │
//! │  MoneyAmountRepository (impl MoneyAmountStore<SqliteTransaction>)      │
//! │  ├── validate every record (pricing-core)                              │
//! │  ├── check references (currency, live price list)                      │
//! │  └── INSERT rows                                                       │
//! │       │                                                                 │
//! │       │  SQL on the shared transaction                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`currency::CurrencyRepository`] - Currencies, keyed by code
//! - [`money_amount::MoneyAmountRepository`] - Prices, tiers, price list prices
//! - [`price_list::PriceListRepository`] - Price list metadata, cascade and soft delete

pub mod currency;
pub mod money_amount;
pub mod price_list;

use std::collections::HashSet;

use pricing_core::{FindConfig, SortDirection};
use sqlx::{Encode, QueryBuilder, Sqlite, SqliteConnection, Type};

use crate::error::DbResult;

/// Appends ` AND column IN (...)`. An empty list matches nothing.
pub(crate) fn push_in<'a, T>(builder: &mut QueryBuilder<'a, Sqlite>, column: &str, values: &[T])
where
    T: 'a + Encode<'a, Sqlite> + Type<Sqlite> + Send + Clone,
{
    if values.is_empty() {
        builder.push(" AND 0");
        return;
    }

    builder.push(" AND ").push(column).push(" IN (");
    let mut list = builder.separated(", ");
    for value in values {
        list.push_bind(value.clone());
    }
    list.push_unseparated(")");
}

/// Appends a case-insensitive substring match over `columns`.
pub(crate) fn push_search(builder: &mut QueryBuilder<'_, Sqlite>, columns: &[&str], q: &str) {
    let pattern = format!("%{}%", q.trim().to_lowercase());

    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder
            .push("LOWER(")
            .push(*column)
            .push(") LIKE ")
            .push_bind(pattern.clone());
    }
    builder.push(")");
}

/// Appends `ORDER BY` (with insertion order as tiebreak) and pagination.
///
/// `column` must come from [`FindConfig::resolve_order`].
pub(crate) fn push_order_and_page(
    builder: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    direction: SortDirection,
    config: &FindConfig,
) {
    builder
        .push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(direction.as_sql());
    if column != "rowid" {
        builder.push(", rowid ASC");
    }

    if config.take.is_some() || config.skip.is_some() {
        // SQLite needs a LIMIT before OFFSET; -1 means unbounded, and any
        // negative value would read as that
        let limit = config
            .take
            .map_or(-1, |take| i64::try_from(take).unwrap_or(i64::MAX));
        let offset = i64::try_from(config.skip.unwrap_or(0)).unwrap_or(i64::MAX);
        builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
    }
}

/// Returns which of `keys` exist in `table.column`, with an extra SQL
/// condition such as ` AND deleted_at IS NULL`.
pub(crate) async fn existing_keys(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    keys: &[String],
    extra: &str,
) -> DbResult<HashSet<String>> {
    if keys.is_empty() {
        return Ok(HashSet::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {column} FROM {table} WHERE 1=1"));
    push_in(&mut builder, column, keys);
    builder.push(extra);

    let found: Vec<String> = builder.build_query_scalar::<String>().fetch_all(&mut *conn).await?;
    Ok(found.into_iter().collect())
}

/// First key (in input order) missing from `existing`.
pub(crate) fn first_missing<'k>(keys: &'k [String], existing: &HashSet<String>) -> Option<&'k String> {
    keys.iter().find(|key| !existing.contains(*key))
}

/// Removes repeats while keeping first-seen order.
pub(crate) fn dedup(keys: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|key| seen.insert(key.clone()))
        .collect()
}
