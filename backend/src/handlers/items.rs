//! HTTP handlers for item master data and per-item stock views

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Item;
use crate::services::item::{CreateItemInput, ItemWithStatus};
use crate::services::stock::ItemStock;
use crate::services::{ItemService, StockService};
use crate::AppState;

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db);
    let item = service.create_item(input).await?;
    Ok(Json(item))
}

/// List all items
pub async fn list_items(State(state): State<AppState>) -> AppResult<Json<Vec<Item>>> {
    let service = ItemService::new(state.db);
    let items = service.list_items().await?;
    Ok(Json(items))
}

/// Get an item
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.db);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// List items at or below their reorder threshold
pub async fn list_low_stock(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ItemWithStatus>>> {
    let service = ItemService::new(state.db);
    let items = service.list_low_stock().await?;
    Ok(Json(items))
}

/// Get an item's on-hand quantity and classification
pub async fn get_item_stock(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ItemStock>> {
    let service = StockService::new(state.db);
    let stock = service.stock(item_id).await?;
    Ok(Json(stock))
}

/// Recompute an item's cached on-hand counter from the full ledger replay
pub async fn recompute_item_stock(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ItemStock>> {
    let service = StockService::new(state.db);
    let stock = service.recompute(item_id).await?;
    Ok(Json(stock))
}
