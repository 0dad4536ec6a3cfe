//! # Price List Repository
//!
//! Database operations for price list metadata.
//!
//! ## Price List Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Price List Lifecycle                              │
//! │                                                                         │
//! │  1. CREATE        create()  → metadata row only (prices come from      │
//! │                               MoneyAmountStore::add_price_list_prices)  │
//! │                                                                         │
//! │  2. UPDATE        update()  → merged metadata, updated_at on change    │
//! │                                                                         │
//! │  3a. DELETE       delete()      → row removed, prices removed by       │
//! │                                   ON DELETE CASCADE                     │
//! │  3b. SOFT DELETE  soft_delete() → deleted_at set, prices removed;      │
//! │                                   the list reads as NotFound after     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use pricing_core::id::{generate_entity_id, PRICE_LIST_ID_PREFIX};
use pricing_core::validation::validate_price_list;
use pricing_core::{
    CreatePriceList, FindConfig, PriceList, PriceListFilter, Relation, UpdatePriceList,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::money_amount::fetch_for_price_lists;
use super::{dedup, existing_keys, first_missing, push_in, push_order_and_page, push_search};
use crate::error::{DbError, DbResult};
use crate::store::PriceListStore;
use crate::transaction::{Conn, SqliteTransaction};

const ENTITY: &str = "PriceList";

const COLUMNS: &str =
    "id, name, description, type, status, starts_at, ends_at, created_at, updated_at, deleted_at";

const LIVE: &str = " AND deleted_at IS NULL";

/// Columns a price list list may be ordered by.
pub const PRICE_LIST_ORDER_FIELDS: &[&str] = &[
    "id",
    "name",
    "type",
    "status",
    "starts_at",
    "ends_at",
    "created_at",
    "updated_at",
];

/// Repository for price list database operations.
#[derive(Debug, Clone)]
pub struct PriceListRepository {
    pool: SqlitePool,
}

impl PriceListRepository {
    /// Creates a new PriceListRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PriceListRepository { pool }
    }
}

impl PriceListStore<SqliteTransaction> for PriceListRepository {
    async fn retrieve(
        &self,
        id: &str,
        config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<PriceList> {
        debug!(id = %id, "Retrieving price list");

        let mut conn = Conn::read(&self.pool, tx).await?;
        let mut price_list = fetch_live(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found(ENTITY, id))?;

        if config.includes_prices() {
            attach_prices(&mut conn, std::slice::from_mut(&mut price_list), config).await?;
        }

        Ok(price_list)
    }

    async fn list(
        &self,
        filter: &PriceListFilter,
        config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<PriceList>> {
        let mut conn = Conn::read(&self.pool, tx).await?;
        let price_lists = select(&mut conn, filter, config).await?;

        debug!(count = price_lists.len(), "Listed price lists");
        Ok(price_lists)
    }

    async fn list_and_count(
        &self,
        filter: &PriceListFilter,
        config: &FindConfig,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<(Vec<PriceList>, u64)> {
        let mut conn = Conn::write(&self.pool, tx).await?;
        let price_lists = select(&mut conn, filter, config).await?;
        let total = count(&mut conn, filter).await?;
        conn.finish().await?;

        debug!(count = price_lists.len(), total, "Listed and counted price lists");
        Ok((price_lists, total))
    }

    async fn create(
        &self,
        data: Vec<CreatePriceList>,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<PriceList>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let price_lists: Vec<PriceList> = data
            .into_iter()
            .map(|payload| payload.into_price_list(generate_entity_id(PRICE_LIST_ID_PREFIX), now))
            .collect();

        for price_list in &price_lists {
            validate_price_list(price_list)?;
        }

        let mut conn = Conn::write(&self.pool, tx).await?;

        for price_list in &price_lists {
            sqlx::query(
                r#"
                INSERT INTO price_list (
                    id, name, description, type, status,
                    starts_at, ends_at, created_at, updated_at, deleted_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)
                "#,
            )
            .bind(&price_list.id)
            .bind(&price_list.name)
            .bind(&price_list.description)
            .bind(price_list.list_type)
            .bind(price_list.status)
            .bind(price_list.starts_at)
            .bind(price_list.ends_at)
            .bind(price_list.created_at)
            .bind(price_list.updated_at)
            .execute(&mut *conn)
            .await?;
        }

        conn.finish().await?;

        debug!(count = price_lists.len(), "Created price lists");
        Ok(price_lists)
    }

    async fn update(
        &self,
        data: Vec<UpdatePriceList>,
        tx: Option<&SqliteTransaction>,
    ) -> DbResult<Vec<PriceList>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut conn = Conn::write(&self.pool, tx).await?;
        let mut updated = Vec::with_capacity(data.len());

        for patch in &data {
            let existing = fetch_live(&mut conn, &patch.id)
                .await?
                .ok_or_else(|| DbError::not_found(ENTITY, &patch.id))?;

            let merged = patch.apply_to(&existing, now);
            validate_price_list(&merged)?;

            if merged != existing {
                sqlx::query(
                    r#"
                    UPDATE price_list
                    SET name = ?1,
                        description = ?2,
                        type = ?3,
                        status = ?4,
                        starts_at = ?5,
                        ends_at = ?6,
                        updated_at = ?7
                    WHERE id = ?8
                    "#,
                )
                .bind(&merged.name)
                .bind(&merged.description)
                .bind(merged.list_type)
                .bind(merged.status)
                .bind(merged.starts_at)
                .bind(merged.ends_at)
                .bind(merged.updated_at)
                .bind(&merged.id)
                .execute(&mut *conn)
                .await?;
            }

            updated.push(merged);
        }

        conn.finish().await?;

        debug!(count = updated.len(), "Updated price lists");
        Ok(updated)
    }

    async fn delete(&self, ids: &[String], tx: Option<&SqliteTransaction>) -> DbResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let ids = dedup(ids.iter().cloned());
        let mut conn = Conn::write(&self.pool, tx).await?;
        ensure_live(&mut conn, &ids).await?;

        // money_amount rows follow through ON DELETE CASCADE
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM price_list WHERE 1=1");
        push_in(&mut builder, "id", &ids);
        builder.build().execute(&mut *conn).await?;

        conn.finish().await?;

        debug!(count = ids.len(), "Deleted price lists");
        Ok(())
    }

    async fn soft_delete(&self, ids: &[String], tx: Option<&SqliteTransaction>) -> DbResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let ids = dedup(ids.iter().cloned());
        let mut conn = Conn::write(&self.pool, tx).await?;
        ensure_live(&mut conn, &ids).await?;

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM money_amount WHERE 1=1");
        push_in(&mut builder, "price_list_id", &ids);
        let removed = builder.build().execute(&mut *conn).await?.rows_affected();

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE price_list SET deleted_at = ");
        builder.push_bind(Utc::now()).push(" WHERE 1=1");
        push_in(&mut builder, "id", &ids);
        builder.build().execute(&mut *conn).await?;

        conn.finish().await?;

        debug!(count = ids.len(), prices_removed = removed, "Soft-deleted price lists");
        Ok(())
    }
}

// =============================================================================
// Queries
// =============================================================================

async fn fetch_live(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PriceList>> {
    let sql = format!("SELECT {COLUMNS} FROM price_list WHERE id = ?1{LIVE}");
    Ok(sqlx::query_as::<_, PriceList>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

async fn ensure_live(conn: &mut SqliteConnection, ids: &[String]) -> DbResult<()> {
    let live = existing_keys(conn, "price_list", "id", ids, LIVE).await?;
    match first_missing(ids, &live) {
        Some(id) => Err(DbError::not_found(ENTITY, id)),
        None => Ok(()),
    }
}

async fn attach_prices(
    conn: &mut SqliteConnection,
    price_lists: &mut [PriceList],
    config: &FindConfig,
) -> DbResult<()> {
    let ids: Vec<String> = price_lists.iter().map(|p| p.id.clone()).collect();
    let with_currency = config.includes(Relation::PricesCurrency);
    let mut grouped = fetch_for_price_lists(conn, &ids, with_currency).await?;

    for price_list in price_lists.iter_mut() {
        price_list.prices = Some(grouped.remove(&price_list.id).unwrap_or_default());
    }

    Ok(())
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &PriceListFilter) {
    builder.push(LIVE);

    if let Some(ids) = &filter.ids {
        push_in(builder, "id", ids);
    }
    if let Some(statuses) = &filter.statuses {
        push_in(builder, "status", statuses);
    }
    if let Some(types) = &filter.types {
        push_in(builder, "type", types);
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        push_search(builder, &["name", "description"], q);
    }
    if let Some(at) = filter.active_at {
        // Timestamps are TEXT; compare as julian days so offsets and
        // fractional seconds don't matter
        builder
            .push(" AND (starts_at IS NULL OR julianday(starts_at) <= julianday(")
            .push_bind(at)
            .push(")) AND (ends_at IS NULL OR julianday(ends_at) >= julianday(")
            .push_bind(at)
            .push("))");
    }
}

async fn select(
    conn: &mut SqliteConnection,
    filter: &PriceListFilter,
    config: &FindConfig,
) -> DbResult<Vec<PriceList>> {
    let (column, direction) = config.resolve_order(PRICE_LIST_ORDER_FIELDS, "rowid")?;

    let mut builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM price_list WHERE 1=1"));
    push_filter(&mut builder, filter);
    push_order_and_page(&mut builder, column, direction, config);

    let mut price_lists = builder
        .build_query_as::<PriceList>()
        .fetch_all(&mut *conn)
        .await?;

    if config.includes_prices() {
        attach_prices(conn, &mut price_lists, config).await?;
    }

    Ok(price_lists)
}

async fn count(conn: &mut SqliteConnection, filter: &PriceListFilter) -> DbResult<u64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM price_list WHERE 1=1");
    push_filter(&mut builder, filter);

    let total: i64 = builder.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
    Ok(total as u64)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::store::{CurrencyStore, MoneyAmountStore};
    use chrono::TimeZone;
    use pricing_core::{
        CreateCurrency, CreateMoneyAmount, ErrorKind, PriceListStatus, PriceListType,
    };

    async fn setup() -> (Database, PriceListRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.currencies()
            .create(vec![CreateCurrency::new("usd", "US Dollar", "$")], None)
            .await
            .unwrap();
        let repo = db.price_lists();
        (db, repo)
    }

    #[tokio::test]
    async fn test_create_and_retrieve_with_prices() {
        let (db, repo) = setup().await;

        let created = repo
            .create(vec![CreatePriceList::new("Summer Sale")], None)
            .await
            .unwrap();
        let list = &created[0];
        assert!(list.id.starts_with("pl_"));
        assert_eq!(list.list_type, PriceListType::Sale);
        assert_eq!(list.status, PriceListStatus::Draft);
        assert!(list.prices.is_none());

        db.money_amounts()
            .add_price_list_prices(&list.id, vec![CreateMoneyAmount::new("usd", 1000)], None)
            .await
            .unwrap();

        let plain = repo.retrieve(&list.id, &FindConfig::new(), None).await.unwrap();
        assert!(plain.prices.is_none());
        assert_eq!(plain.created_at, list.created_at);

        let config = FindConfig::new().with_relation(Relation::PricesCurrency);
        let loaded = repo.retrieve(&list.id, &config, None).await.unwrap();
        let prices = loaded.prices.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].currency.as_ref().unwrap().code, "usd");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_prices() {
        let (db, repo) = setup().await;
        let list = repo
            .create(vec![CreatePriceList::new("Summer Sale")], None)
            .await
            .unwrap()
            .remove(0);
        let prices = db
            .money_amounts()
            .add_price_list_prices(
                &list.id,
                vec![CreateMoneyAmount::new("usd", 1000), CreateMoneyAmount::new("usd", 900)],
                None,
            )
            .await
            .unwrap();

        repo.delete(&[list.id.clone()], None).await.unwrap();

        let err = repo.retrieve(&list.id, &FindConfig::new(), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        for price in &prices {
            let err = db
                .money_amounts()
                .retrieve(&price.id, &FindConfig::new(), None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails_whole_batch() {
        let (_db, repo) = setup().await;
        let list = repo
            .create(vec![CreatePriceList::new("Summer Sale")], None)
            .await
            .unwrap()
            .remove(0);

        let err = repo
            .delete(&[list.id.clone(), "pl_unknown".to_string()], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(repo.retrieve(&list.id, &FindConfig::new(), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_list() {
        let (db, repo) = setup().await;
        let list = repo
            .create(vec![CreatePriceList::new("Summer Sale")], None)
            .await
            .unwrap()
            .remove(0);
        let price = db
            .money_amounts()
            .add_price_list_prices(&list.id, vec![CreateMoneyAmount::new("usd", 1000)], None)
            .await
            .unwrap()
            .remove(0);

        repo.soft_delete(&[list.id.clone()], None).await.unwrap();

        assert!(repo.retrieve(&list.id, &FindConfig::new(), None).await.is_err());
        assert!(db
            .money_amounts()
            .retrieve(&price.id, &FindConfig::new(), None)
            .await
            .is_err());

        let (rows, total) = repo
            .list_and_count(&PriceListFilter::default(), &FindConfig::new(), None)
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);

        let err = repo
            .update(vec![UpdatePriceList::new(list.id.clone())], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = db
            .money_amounts()
            .create(vec![CreateMoneyAmount::new("usd", 1).in_price_list(list.id.clone())], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialViolation);
    }

    #[tokio::test]
    async fn test_update_merges_and_validates() {
        let (_db, repo) = setup().await;
        let list = repo
            .create(vec![CreatePriceList::new("Summer Sale")], None)
            .await
            .unwrap()
            .remove(0);

        let patch = UpdatePriceList {
            status: Some(PriceListStatus::Active),
            description: Some("Up to 30% off".to_string()),
            ..UpdatePriceList::new(list.id.clone())
        };
        let updated = repo.update(vec![patch.clone()], None).await.unwrap().remove(0);
        assert_eq!(updated.status, PriceListStatus::Active);
        assert_eq!(updated.name, "Summer Sale");

        let again = repo.update(vec![patch], None).await.unwrap().remove(0);
        assert_eq!(again, updated);

        let inverted = UpdatePriceList {
            starts_at: Some(Some(Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap())),
            ends_at: Some(Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())),
            ..UpdatePriceList::new(list.id.clone())
        };
        let err = repo.update(vec![inverted], None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (_db, repo) = setup().await;
        let summer = CreatePriceList {
            status: PriceListStatus::Active,
            starts_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            ends_at: Some(Utc.with_ymd_and_hms(2024, 8, 31, 23, 59, 59).unwrap()),
            ..CreatePriceList::new("Summer Sale")
        };
        let wholesale = CreatePriceList {
            list_type: PriceListType::Override,
            ..CreatePriceList::new("Wholesale")
        };
        repo.create(vec![summer, wholesale], None).await.unwrap();

        let active = PriceListFilter {
            statuses: Some(vec![PriceListStatus::Active]),
            ..Default::default()
        };
        let rows = repo.list(&active, &FindConfig::new(), None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Summer Sale");

        let overrides = PriceListFilter {
            types: Some(vec![PriceListType::Override]),
            ..Default::default()
        };
        let rows = repo.list(&overrides, &FindConfig::new(), None).await.unwrap();
        assert_eq!(rows[0].name, "Wholesale");

        let in_july = PriceListFilter {
            active_at: Some(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()),
            ..Default::default()
        };
        let (_, total) = repo
            .list_and_count(&in_july, &FindConfig::new(), None)
            .await
            .unwrap();
        assert_eq!(total, 2);

        let in_october = PriceListFilter {
            active_at: Some(Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let rows = repo.list(&in_october, &FindConfig::new(), None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Wholesale");

        let search = PriceListFilter {
            q: Some("summer".to_string()),
            ..Default::default()
        };
        let rows = repo.list(&search, &FindConfig::new(), None).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
