//! HTTP handlers for movement recording

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{LineInput, Movement};
use crate::services::movement::{MovementResult, MovementWithLines, RecordMovementInput};
use crate::services::MovementService;
use crate::AppState;

/// Record a movement (delivery note) atomically
pub async fn record_movement(
    State(state): State<AppState>,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<Json<MovementResult>> {
    let service = MovementService::new(state.db);
    let result = service.record(input).await?;
    Ok(Json(result))
}

/// List movement headers
pub async fn list_movements(State(state): State<AppState>) -> AppResult<Json<Vec<Movement>>> {
    let service = MovementService::new(state.db);
    let movements = service.list().await?;
    Ok(Json(movements))
}

/// Get a movement with its lines
pub async fn get_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MovementWithLines>> {
    let service = MovementService::new(state.db);
    let movement = service.get(movement_id).await?;
    Ok(Json(movement))
}

/// Replace the whole line set of a committed movement
pub async fn replace_movement_lines(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
    Json(lines): Json<Vec<LineInput>>,
) -> AppResult<Json<MovementResult>> {
    let service = MovementService::new(state.db);
    let result = service.replace_lines(movement_id, lines).await?;
    Ok(Json(result))
}

/// Delete a movement, reversing its ledger effects
pub async fn delete_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = MovementService::new(state.db);
    service.delete(movement_id).await?;
    Ok(Json(()))
}
