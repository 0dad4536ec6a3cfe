//! # Money Module
//!
//! Provides the `Money` type used for every stored price amount.
//!
//! ## Why Integer Minor Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units of the price's currency              │
//! │    usd (2 digits):  1000  →  10.00                                      │
//! │    jpy (0 digits):  1000  →  1000                                       │
//! │    kwd (3 digits):  1000  →  1.000                                      │
//! │                                                                         │
//! │  The currency's `decimal_digits` is only needed for display.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pricing_core::money::Money;
//!
//! let price = Money::from_minor(1099);
//! assert_eq!(price.minor(), 1099);
//! assert_eq!(price.format(2), "10.99");
//! ```
//!
//! The engine stores price facts only, so `Money` deliberately has no
//! arithmetic: derived prices are computed elsewhere.

use serde::{Deserialize, Serialize};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest unit of its currency.
///
/// ## Design Decisions
/// - **i64 (signed)**: matches SQLite INTEGER; negative values are rejected
///   by validation rather than by the type
/// - **Single field tuple struct**: zero-cost, serializes as a bare number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::money::Money;
    ///
    /// let price = Money::from_minor(1000); // 10.00 in a 2-digit currency
    /// assert_eq!(price.minor(), 1000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Formats the value with a currency's number of decimal digits.
    ///
    /// ## Example
    /// ```rust
    /// use pricing_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1000).format(2), "10.00");
    /// assert_eq!(Money::from_minor(1000).format(0), "1000");
    /// assert_eq!(Money::from_minor(-5).format(3), "-0.005");
    /// ```
    pub fn format(&self, decimal_digits: u32) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();

        if decimal_digits == 0 {
            return format!("{sign}{abs}");
        }

        // Past 10^19 the scale leaves u64, and every i64 magnitude is
        // below it anyway
        let (units, fraction) = match 10u64.checked_pow(decimal_digits) {
            Some(scale) => (abs / scale, abs % scale),
            None => (0, abs),
        };
        format!(
            "{sign}{units}.{fraction:0width$}",
            width = decimal_digits as usize
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Money(minor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
