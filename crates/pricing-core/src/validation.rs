//! # Validation Module
//!
//! Invariant checks run by the stores before anything is written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization                                              │
//! │  └── Shape and types of payloads (serde)                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Runs on the merged entity (create payload or patched record)      │
//! │  └── Amount >= 0, quantity tiers, windows, lengths                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── PRIMARY KEY on currency code                                      │
//! │  └── Foreign keys (currency RESTRICT, price list CASCADE)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pricing_core::validation::{validate_currency_code, validate_quantity_tier};
//!
//! assert!(validate_currency_code("usd").is_ok());
//! assert!(validate_quantity_tier(Some(10), Some(1)).is_err());
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Currency, MoneyAmount, PriceList};
use crate::{
    CURRENCY_CODE_LENGTH, MAX_CURRENCY_NAME_LENGTH, MAX_CURRENCY_SYMBOL_LENGTH,
    MAX_DECIMAL_DIGITS, MAX_PRICE_LIST_NAME_LENGTH,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Currency
// =============================================================================

/// Validates a currency code.
///
/// ## Rules
/// - Exactly 3 characters
/// - Lowercase ASCII letters only ("usd", not "USD")
///
/// ## Example
/// ```rust
/// use pricing_core::validation::validate_currency_code;
///
/// assert!(validate_currency_code("eur").is_ok());
/// assert!(validate_currency_code("EUR").is_err());
/// assert!(validate_currency_code("").is_err());
/// ```
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if code.len() != CURRENCY_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must be 3 lowercase letters".to_string(),
        });
    }

    Ok(())
}

/// Validates a full currency record.
pub fn validate_currency(currency: &Currency) -> ValidationResult<()> {
    validate_currency_code(&currency.code)?;
    validate_text("name", &currency.name, MAX_CURRENCY_NAME_LENGTH)?;
    validate_text("symbol", &currency.symbol, MAX_CURRENCY_SYMBOL_LENGTH)?;

    if currency.decimal_digits > MAX_DECIMAL_DIGITS {
        return Err(ValidationError::OutOfRange {
            field: "decimal_digits".to_string(),
            min: 0,
            max: MAX_DECIMAL_DIGITS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Money Amount
// =============================================================================

/// Validates that an amount is not negative. An absent amount is allowed.
pub fn validate_amount(amount: Option<Money>) -> ValidationResult<()> {
    match amount {
        Some(money) if money.is_negative() => Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        }),
        _ => Ok(()),
    }
}

/// Validates a quantity tier.
///
/// ## Rules
/// - Each bound, when present, is >= 0
/// - When both are present, `min_quantity <= max_quantity`
///
/// ## Example
/// ```rust
/// use pricing_core::validation::validate_quantity_tier;
///
/// assert!(validate_quantity_tier(Some(1), Some(10)).is_ok());
/// assert!(validate_quantity_tier(None, Some(10)).is_ok());
/// assert!(validate_quantity_tier(Some(-1), None).is_err());
/// ```
pub fn validate_quantity_tier(min: Option<i64>, max: Option<i64>) -> ValidationResult<()> {
    for (field, value) in [("min_quantity", min), ("max_quantity", max)] {
        if matches!(value, Some(v) if v < 0) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ValidationError::InvertedRange {
                lower: "min_quantity".to_string(),
                upper: "max_quantity".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a money amount as it would be stored.
pub fn validate_money_amount(money_amount: &MoneyAmount) -> ValidationResult<()> {
    if let Some(code) = &money_amount.currency_code {
        validate_currency_code(code).map_err(|_| ValidationError::InvalidFormat {
            field: "currency_code".to_string(),
            reason: format!("'{}' is not a currency code", code),
        })?;
    }
    validate_amount(money_amount.amount)?;
    validate_quantity_tier(money_amount.min_quantity, money_amount.max_quantity)
}

// =============================================================================
// Price List
// =============================================================================

/// Validates a validity window; either bound may be open.
pub fn validate_validity_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    if let (Some(start), Some(end)) = (starts_at, ends_at) {
        if start > end {
            return Err(ValidationError::InvertedRange {
                lower: "starts_at".to_string(),
                upper: "ends_at".to_string(),
            });
        }
    }
    Ok(())
}

/// Validates a price list as it would be stored.
pub fn validate_price_list(price_list: &PriceList) -> ValidationResult<()> {
    validate_text("name", &price_list.name, MAX_PRICE_LIST_NAME_LENGTH)?;
    validate_validity_window(price_list.starts_at, price_list.ends_at)
}

// =============================================================================
// Helpers
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
