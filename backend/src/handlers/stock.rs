//! HTTP handlers for warehouse-wide stock views

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::stock::StockDrift;
use crate::services::StockService;
use crate::AppState;

/// Compare cached on-hand counters against the full ledger replay
pub async fn get_stock_reconciliation(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StockDrift>>> {
    let service = StockService::new(state.db);
    let drift = service.reconcile().await?;
    Ok(Json(drift))
}
