//! Jobs (work sites) and job-negotiated material pricing

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contracted job the warehouse ships material to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Human-assigned job code (e.g. "C-2024-031")
    pub code: String,
    pub description: String,
    pub client_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per (job, item) billing rate that overrides actual purchase cost.
///
/// Set when a job bills material at a negotiated rate, or to price
/// fictitious lines that have no batch cost behind them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FictitiousPrice {
    pub job_id: Uuid,
    pub item_id: Uuid,
    pub price: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Derived material cost for a job; never stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMaterialCost {
    pub job_id: Uuid,
    /// Sum of quantity x recorded unit price over committed exit/sale lines
    pub total: Decimal,
    pub line_count: i64,
    /// Lines whose price resolved to zero and still await review
    pub missing_price_lines: i64,
}
