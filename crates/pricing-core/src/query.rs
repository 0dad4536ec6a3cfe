//! # Query Options
//!
//! Filters and find configuration accepted by the stores' list operations.
//!
//! ```text
//! list(filter, FindConfig { relations, skip, take, order })
//!        │                     │          │     │     │
//!        │                     │          │     │     └─ whitelisted column
//!        │                     │          └─────┴─ LIMIT / OFFSET
//!        │                     └─ eager-loaded related records
//!        └─ WHERE clauses (AND-ed; an empty id list matches nothing)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{PriceListStatus, PriceListType};

// =============================================================================
// Relations
// =============================================================================

/// Related records that can be eager-loaded on retrieve/list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// The Currency of a Money Amount.
    #[serde(rename = "currency")]
    Currency,
    /// The Money Amounts of a Price List.
    #[serde(rename = "prices")]
    Prices,
    /// The Money Amounts of a Price List, each with its Currency.
    #[serde(rename = "prices.currency")]
    PricesCurrency,
}

// =============================================================================
// Ordering
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Requested ordering; `field` is checked against a per-entity whitelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

// =============================================================================
// Find Config
// =============================================================================

/// Relation loading, pagination and ordering for reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindConfig {
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub take: Option<u64>,
    #[serde(default)]
    pub order: Option<OrderBy>,
}

impl FindConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a relation to be loaded.
    pub fn with_relation(mut self, relation: Relation) -> Self {
        if !self.relations.contains(&relation) {
            self.relations.push(relation);
        }
        self
    }

    /// Skips the first `skip` records.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Returns at most `take` records.
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// Orders by `field` in `direction`.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Whether `relation` was requested.
    pub fn includes(&self, relation: Relation) -> bool {
        self.relations.contains(&relation)
    }

    /// Whether a price list's prices must be loaded (directly or nested).
    pub fn includes_prices(&self) -> bool {
        self.includes(Relation::Prices) || self.includes(Relation::PricesCurrency)
    }

    /// Resolves the ordering against `allowed` columns.
    ///
    /// Falls back to `default` ascending when no order was requested. The
    /// returned column is always one of `allowed`, so it is safe to splice
    /// into SQL.
    pub fn resolve_order(
        &self,
        allowed: &[&'static str],
        default: &'static str,
    ) -> Result<(&'static str, SortDirection), ValidationError> {
        let Some(order) = &self.order else {
            return Ok((default, SortDirection::Asc));
        };

        allowed
            .iter()
            .find(|column| **column == order.field)
            .map(|column| (*column, order.direction))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "order".to_string(),
                allowed: allowed.iter().map(|c| c.to_string()).collect(),
            })
    }

    /// Returns a copy without pagination, for counting.
    pub fn without_pagination(&self) -> Self {
        FindConfig {
            skip: None,
            take: None,
            ..self.clone()
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Filter for currency lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFilter {
    /// Restrict to these codes.
    #[serde(default)]
    pub codes: Option<Vec<String>>,
    /// Case-insensitive substring match on code or name.
    #[serde(default)]
    pub q: Option<String>,
}

impl CurrencyFilter {
    pub fn codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CurrencyFilter {
            codes: Some(codes.into_iter().map(Into::into).collect()),
            q: None,
        }
    }
}

/// Filter for money amount lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmountFilter {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub currency_codes: Option<Vec<String>>,
    #[serde(default)]
    pub price_list_ids: Option<Vec<String>>,
    /// Only prices that belong to no price list.
    #[serde(default)]
    pub standalone_only: bool,
    /// Only prices whose quantity tier contains this quantity.
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl MoneyAmountFilter {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MoneyAmountFilter {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn price_list_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MoneyAmountFilter {
            price_list_ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }
}

/// Filter for price list lists. Soft-deleted lists never match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListFilter {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub statuses: Option<Vec<PriceListStatus>>,
    #[serde(default)]
    pub types: Option<Vec<PriceListType>>,
    /// Case-insensitive substring match on name or description.
    #[serde(default)]
    pub q: Option<String>,
    /// Only lists whose validity window contains this instant.
    #[serde(default)]
    pub active_at: Option<DateTime<Utc>>,
}

impl PriceListFilter {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PriceListFilter {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }
}
