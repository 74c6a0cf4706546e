//! Item master data and stock classification

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked article (extinguisher, hose, sprinkler fitting, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    /// Unique human-assigned article code (e.g. "EST-6KG-ABC")
    pub code: String,
    pub name: String,
    /// Stock unit symbol: "pz", "m", "kg"
    pub unit: String,
    /// Base units per packaging piece; 1 means no packaging conversion
    pub coefficient: Decimal,
    /// Reorder threshold in base units
    pub min_stock: Decimal,
    /// Cached ledger sum; never ground truth, always re-derivable
    pub on_hand: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock level classification against the item's reorder threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "in_stock"),
            StockStatus::LowStock => write!(f, "low_stock"),
            StockStatus::OutOfStock => write!(f, "out_of_stock"),
        }
    }
}

/// Classify an on-hand quantity against the reorder threshold.
pub fn classify_stock(on_hand: Decimal, min_stock: Decimal) -> StockStatus {
    if on_hand <= Decimal::ZERO {
        StockStatus::OutOfStock
    } else if on_hand <= min_stock {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}
