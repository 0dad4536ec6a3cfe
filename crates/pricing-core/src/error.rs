//! # Error Types
//!
//! Domain-specific error types for pricing-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pricing-core (this file)                                              │
//! │  ├── ValidationError  - Payload violates an invariant                  │
//! │  └── ErrorKind        - Caller-facing taxonomy shared by all layers    │
//! │                                                                         │
//! │  pricing-db                                                            │
//! │  └── DbError          - Store failures (NotFound, Referential, ...)    │
//! │                                                                         │
//! │  pricing-service                                                       │
//! │  └── PricingError     - DbError, or TransactionAborted for composites  │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → PricingError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, id, value)
//! 3. Errors are enum variants, never String
//! 4. Every error maps onto exactly one [`ErrorKind`]

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Caller-facing error taxonomy.
///
/// Every error surfaced by the pricing engine maps onto one of these kinds,
/// so the (external) API layer can translate failures without matching on
/// messages.
///
/// ```json
/// { "kind": "NOT_FOUND", "message": "MoneyAmount not found: ma_123" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// An id does not exist (or names a soft-deleted record).
    NotFound,
    /// A payload violates an invariant or a unique key.
    ValidationFailed,
    /// A reference points at a Currency or Price List that does not exist.
    ReferentialViolation,
    /// A composite operation failed and nothing it wrote was kept.
    TransactionAborted,
    /// The persistence layer itself failed (connection, pool, SQL).
    Storage,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a payload doesn't meet the data model's
/// invariants. They are raised before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate currency code in one batch).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A lower bound is greater than its upper bound.
    ///
    /// ## When This Occurs
    /// - `min_quantity > max_quantity` on a Money Amount
    /// - `starts_at > ends_at` on a Price List
    #[error("{lower} must not be greater than {upper}")]
    InvertedRange { lower: String, upper: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("name");
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvertedRange {
            lower: "min_quantity".to_string(),
            upper: "max_quantity".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "min_quantity must not be greater than max_quantity"
        );
    }

    #[test]
    fn test_error_kind_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ReferentialViolation).unwrap();
        assert_eq!(json, "\"REFERENTIAL_VIOLATION\"");
    }
}
