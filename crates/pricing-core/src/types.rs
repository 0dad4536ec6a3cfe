//! # Domain Types
//!
//! Entities and payloads of the pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Currency     │   │   MoneyAmount   │   │    PriceList    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code (PK)      │◄──│  currency_code  │   │  id (pl_...)    │       │
//! │  │  name           │   │  id (ma_...)    │   │  name, type     │       │
//! │  │  symbol         │   │  amount         │   │  status         │       │
//! │  │  decimal_digits │   │  min/max_qty    │   │  starts/ends_at │       │
//! │  └─────────────────┘   │  price_list_id ─┼──►│  deleted_at     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Currency ◄── referenced (shared, never owned)                          │
//! │  PriceList ──► owns its MoneyAmounts (cascade delete)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payload Conventions
//! - `Create*` payloads never carry an id: ids are generated by the store.
//! - `Update*` payloads always carry an id and patch the rest.
//! - Nullable fields in updates are `Option<Option<T>>`:
//!   absent → unchanged, `null` → cleared, value → set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::money::Money;
use crate::DEFAULT_DECIMAL_DIGITS;

// =============================================================================
// Currency
// =============================================================================

/// A monetary unit referenced by Money Amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Currency {
    /// Unique code, lowercase (e.g. "usd").
    pub code: String,

    /// Display name ("US Dollar").
    pub name: String,

    /// Display symbol ("$").
    pub symbol: String,

    /// Number of minor-unit digits (2 for usd, 0 for jpy).
    pub decimal_digits: u32,
}

/// Payload for creating a currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCurrency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimal_digits")]
    pub decimal_digits: u32,
}

impl CreateCurrency {
    /// Creates a payload with the default precision of 2 digits.
    pub fn new(code: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        CreateCurrency {
            code: code.into(),
            name: name.into(),
            symbol: symbol.into(),
            decimal_digits: DEFAULT_DECIMAL_DIGITS,
        }
    }

    /// Sets the number of decimal digits.
    pub fn decimal_digits(mut self, digits: u32) -> Self {
        self.decimal_digits = digits;
        self
    }

    /// Builds the entity this payload describes.
    pub fn into_currency(self) -> Currency {
        Currency {
            code: self.code,
            name: self.name,
            symbol: self.symbol,
            decimal_digits: self.decimal_digits,
        }
    }
}

/// Payload for updating a currency, addressed by code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCurrency {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimal_digits: Option<u32>,
}

impl UpdateCurrency {
    /// Applies this patch to a stored currency, returning the new state.
    pub fn apply_to(&self, existing: &Currency) -> Currency {
        Currency {
            code: existing.code.clone(),
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            symbol: self
                .symbol
                .clone()
                .unwrap_or_else(|| existing.symbol.clone()),
            decimal_digits: self.decimal_digits.unwrap_or(existing.decimal_digits),
        }
    }
}

fn default_decimal_digits() -> u32 {
    DEFAULT_DECIMAL_DIGITS
}

// =============================================================================
// Money Amount
// =============================================================================

/// A single price in one currency, optionally tiered by quantity and
/// optionally owned by a Price List.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MoneyAmount {
    /// Generated id (`ma_...`).
    pub id: String,

    /// Referenced currency, if any.
    pub currency_code: Option<String>,

    /// Amount in minor units of the currency.
    pub amount: Option<Money>,

    /// Lower bound of the quantity tier (inclusive).
    pub min_quantity: Option<i64>,

    /// Upper bound of the quantity tier (inclusive).
    pub max_quantity: Option<i64>,

    /// Owning price list. `None` means a standalone/default price.
    pub price_list_id: Option<String>,

    /// Populated only when the `currency` relation was requested.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
}

/// Payload for creating a money amount.
///
/// When used as part of a price list, `price_list_id` is overwritten with
/// the owning list's id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMoneyAmount {
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub min_quantity: Option<i64>,
    #[serde(default)]
    pub max_quantity: Option<i64>,
    #[serde(default)]
    pub price_list_id: Option<String>,
}

impl CreateMoneyAmount {
    /// Creates a price of `amount` minor units in `currency_code`.
    pub fn new(currency_code: impl Into<String>, amount: i64) -> Self {
        CreateMoneyAmount {
            currency_code: Some(currency_code.into()),
            amount: Some(Money::from_minor(amount)),
            ..Default::default()
        }
    }

    /// Restricts the price to a quantity tier.
    pub fn tier(mut self, min_quantity: Option<i64>, max_quantity: Option<i64>) -> Self {
        self.min_quantity = min_quantity;
        self.max_quantity = max_quantity;
        self
    }

    /// Assigns the price to a price list.
    pub fn in_price_list(mut self, price_list_id: impl Into<String>) -> Self {
        self.price_list_id = Some(price_list_id.into());
        self
    }

    /// Builds the entity this payload describes under the given id.
    pub fn into_money_amount(self, id: String) -> MoneyAmount {
        MoneyAmount {
            id,
            currency_code: self.currency_code,
            amount: self.amount,
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
            price_list_id: self.price_list_id,
            currency: None,
        }
    }
}

/// Payload for updating a money amount, addressed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMoneyAmount {
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub currency_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub amount: Option<Option<Money>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub min_quantity: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub max_quantity: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub price_list_id: Option<Option<String>>,
}

impl UpdateMoneyAmount {
    /// Creates an empty patch for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        UpdateMoneyAmount {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sets the amount in minor units.
    pub fn amount(mut self, amount: i64) -> Self {
        self.amount = Some(Some(Money::from_minor(amount)));
        self
    }

    /// Sets the currency.
    pub fn currency_code(mut self, code: impl Into<String>) -> Self {
        self.currency_code = Some(Some(code.into()));
        self
    }

    /// Applies this patch to a stored money amount, returning the new state.
    ///
    /// Relations are not carried over: the result reflects stored columns
    /// only.
    pub fn apply_to(&self, existing: &MoneyAmount) -> MoneyAmount {
        MoneyAmount {
            id: existing.id.clone(),
            currency_code: patch(&self.currency_code, &existing.currency_code),
            amount: patch(&self.amount, &existing.amount),
            min_quantity: patch(&self.min_quantity, &existing.min_quantity),
            max_quantity: patch(&self.max_quantity, &existing.max_quantity),
            price_list_id: patch(&self.price_list_id, &existing.price_list_id),
            currency: None,
        }
    }
}

// =============================================================================
// Price List Type & Status
// =============================================================================

/// Kind of price list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PriceListType {
    /// Temporary sale prices.
    #[default]
    Sale,
    /// Prices that replace the default prices outright.
    Override,
}

/// Lifecycle status of a price list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PriceListStatus {
    /// Being prepared, not yet applied.
    #[default]
    Draft,
    /// Applied within its validity window.
    Active,
    /// No longer applied.
    Expired,
}

// =============================================================================
// Price List
// =============================================================================

/// A named, time-bounded collection of Money Amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PriceList {
    /// Generated id (`pl_...`).
    pub id: String,

    pub name: String,

    pub description: String,

    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub list_type: PriceListType,

    pub status: PriceListStatus,

    /// Start of the validity window; `None` means unbounded.
    pub starts_at: Option<DateTime<Utc>>,

    /// End of the validity window; `None` means unbounded.
    pub ends_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker. Stores never return lists where this is set.
    pub deleted_at: Option<DateTime<Utc>>,

    /// Populated only when the `prices` relation was requested, or when the
    /// list was just created together with its prices.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prices: Option<Vec<MoneyAmount>>,
}

impl PriceList {
    /// Checks whether the validity window contains `at`.
    ///
    /// Open bounds are unbounded, so a list without a window is always
    /// in effect.
    pub fn is_in_window(&self, at: DateTime<Utc>) -> bool {
        self.starts_at.map_or(true, |start| start <= at)
            && self.ends_at.map_or(true, |end| at <= end)
    }
}

/// Metadata payload for creating a price list (no prices).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePriceList {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub list_type: PriceListType,
    #[serde(default)]
    pub status: PriceListStatus,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl CreatePriceList {
    /// Creates a draft sale list named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        CreatePriceList {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builds the entity this payload describes.
    pub fn into_price_list(self, id: String, now: DateTime<Utc>) -> PriceList {
        PriceList {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            list_type: self.list_type,
            status: self.status,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            prices: None,
        }
    }
}

/// Metadata patch for a price list, addressed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePriceList {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub list_type: Option<PriceListType>,
    #[serde(default)]
    pub status: Option<PriceListStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

impl UpdatePriceList {
    /// Creates an empty patch for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        UpdatePriceList {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Applies this patch to a stored price list.
    ///
    /// `updated_at` moves to `now` only when a field actually changed, so
    /// re-applying the same patch leaves the stored row untouched.
    pub fn apply_to(&self, existing: &PriceList, now: DateTime<Utc>) -> PriceList {
        let mut merged = PriceList {
            id: existing.id.clone(),
            name: self
                .name
                .as_deref()
                .map(|name| name.trim().to_string())
                .unwrap_or_else(|| existing.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            list_type: self.list_type.unwrap_or(existing.list_type),
            status: self.status.unwrap_or(existing.status),
            starts_at: patch(&self.starts_at, &existing.starts_at),
            ends_at: patch(&self.ends_at, &existing.ends_at),
            created_at: existing.created_at,
            updated_at: existing.updated_at,
            deleted_at: existing.deleted_at,
            prices: None,
        };

        let unchanged = merged.name == existing.name
            && merged.description == existing.description
            && merged.list_type == existing.list_type
            && merged.status == existing.status
            && merged.starts_at == existing.starts_at
            && merged.ends_at == existing.ends_at;
        if !unchanged {
            merged.updated_at = now;
        }

        merged
    }
}

// =============================================================================
// Price List Bulk Inputs
// =============================================================================

/// One price inside a price list bulk call.
///
/// With an `id` it patches an existing money amount; without one it
/// describes a new money amount. `price_list_id` is always overwritten with
/// the owning list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListPriceInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub currency_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub amount: Option<Option<Money>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub min_quantity: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub max_quantity: Option<Option<i64>>,
    #[serde(default)]
    pub price_list_id: Option<String>,
}

impl PriceListPriceInput {
    /// A new price of `amount` minor units in `currency_code`.
    pub fn new(currency_code: impl Into<String>, amount: i64) -> Self {
        PriceListPriceInput {
            currency_code: Some(Some(currency_code.into())),
            amount: Some(Some(Money::from_minor(amount))),
            ..Default::default()
        }
    }

    /// A patch of an existing price's amount.
    pub fn existing(id: impl Into<String>, amount: i64) -> Self {
        PriceListPriceInput {
            id: Some(id.into()),
            amount: Some(Some(Money::from_minor(amount))),
            ..Default::default()
        }
    }
}

/// A price list to create together with its initial prices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePriceListInput {
    #[serde(flatten)]
    pub price_list: CreatePriceList,
    #[serde(default)]
    pub prices: Vec<CreateMoneyAmount>,
}

impl CreatePriceListInput {
    /// Creates an input with no prices.
    pub fn new(price_list: CreatePriceList) -> Self {
        CreatePriceListInput {
            price_list,
            prices: Vec::new(),
        }
    }

    /// Adds an initial price.
    pub fn with_price(mut self, price: CreateMoneyAmount) -> Self {
        self.prices.push(price);
        self
    }

    /// Separates metadata from prices; prices are never passed to the
    /// metadata store.
    pub fn into_parts(self) -> (CreatePriceList, Vec<CreateMoneyAmount>) {
        (self.price_list, self.prices)
    }
}

/// A price list patch together with prices to update or add.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePriceListInput {
    #[serde(flatten)]
    pub price_list: UpdatePriceList,
    #[serde(default)]
    pub prices: Vec<PriceListPriceInput>,
}

impl UpdatePriceListInput {
    /// Creates an input that only touches list `id`.
    pub fn new(id: impl Into<String>) -> Self {
        UpdatePriceListInput {
            price_list: UpdatePriceList::new(id),
            prices: Vec::new(),
        }
    }

    /// Adds a price to update (with id) or create (without id).
    pub fn with_price(mut self, price: PriceListPriceInput) -> Self {
        self.prices.push(price);
        self
    }

    /// Separates metadata from prices, stamping every price with the
    /// owning list's id.
    pub fn into_parts(self) -> (UpdatePriceList, Vec<PriceListPriceInput>) {
        let owner = self.price_list.id.clone();
        let prices = self
            .prices
            .into_iter()
            .map(|price| PriceListPriceInput {
                price_list_id: Some(owner.clone()),
                ..price
            })
            .collect();

        (self.price_list, prices)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn patch<T: Clone>(change: &Option<Option<T>>, current: &Option<T>) -> Option<T> {
    match change {
        Some(value) => value.clone(),
        None => current.clone(),
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// =============================================================================
// Unit Tests
// =============================================================================
