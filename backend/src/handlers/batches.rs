//! HTTP handlers for the batch (lot) ledger

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Batch;
use crate::services::batch::CreateBatchInput;
use crate::services::BatchLedgerService;
use crate::AppState;

/// Register a purchased lot directly
pub async fn create_batch(
    State(state): State<AppState>,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<Json<Batch>> {
    let service = BatchLedgerService::new(state.db);
    let batch = service.create_batch(input).await?;
    Ok(Json(batch))
}

/// Get a batch
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Batch>> {
    let service = BatchLedgerService::new(state.db);
    let batch = service.get_batch(batch_id).await?;
    Ok(Json(batch))
}

/// List an item's lots that still hold material, oldest first
pub async fn list_available_batches(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<Batch>>> {
    let service = BatchLedgerService::new(state.db);
    let batches = service.list_available_batches(item_id).await?;
    Ok(Json(batches))
}

/// List every lot of an item, exhausted ones included
pub async fn list_all_batches(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<Batch>>> {
    let service = BatchLedgerService::new(state.db);
    let batches = service.list_batches(item_id).await?;
    Ok(Json(batches))
}
