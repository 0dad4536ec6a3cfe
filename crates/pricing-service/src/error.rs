//! # Service Error Types
//!
//! Simple delegations surface the store error as-is. Composite operations
//! wrap it in [`PricingError::TransactionAborted`] so callers know the
//! whole scope was rolled back.

use pricing_core::ErrorKind;
use pricing_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    /// A store call failed.
    #[error(transparent)]
    Store(#[from] DbError),

    /// A composite operation failed and its transaction scope was aborted.
    #[error("{operation} aborted: {source}")]
    TransactionAborted {
        operation: &'static str,
        #[source]
        source: DbError,
    },
}

impl PricingError {
    pub(crate) fn aborted(operation: &'static str, source: DbError) -> Self {
        PricingError::TransactionAborted { operation, source }
    }

    /// Maps this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::Store(err) => err.kind(),
            PricingError::TransactionAborted { .. } => ErrorKind::TransactionAborted,
        }
    }

    /// Kind of the underlying store failure, looking through an abort.
    pub fn root_kind(&self) -> ErrorKind {
        match self {
            PricingError::Store(err) | PricingError::TransactionAborted { source: err, .. } => {
                err.kind()
            }
        }
    }
}

pub type PricingResult<T> = Result<T, PricingError>;
