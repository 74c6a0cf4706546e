//! Domain errors for the movement and batch ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Business-rule violations raised by the ledger core.
///
/// These are surfaced synchronously to the caller and never retried:
/// an overdraw is a business decision, not a transient fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Item coefficient must be greater than zero")]
    InvalidCoefficient,

    #[error("Line quantity must be strictly positive")]
    InvalidQuantity,

    #[error("Insufficient batch quantity: requested {requested}, remaining {remaining}")]
    InsufficientBatchQuantity {
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("Restock exceeds original receipt: requested {requested}, capacity {capacity}")]
    ExceedsOriginal {
        requested: Decimal,
        capacity: Decimal,
    },

    #[error("Fictitious price must not be negative")]
    InvalidPrice,

    #[error("Exit and sale lines must reference a batch")]
    MissingBatch,

    #[error("Line must supply a quantity or a piece count")]
    MissingDimension,
}
