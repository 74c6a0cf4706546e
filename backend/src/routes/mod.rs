//! Route definitions for the warehouse backend

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Item master data and per-item stock
        .nest("/items", item_routes())
        // Batch ledger
        .nest("/batches", batch_routes())
        // Movement recording
        .nest("/movements", movement_routes())
        // Jobs, costing, and fictitious pricing
        .nest("/jobs", job_routes())
        // Warehouse-wide stock views
        .nest("/stock", stock_routes())
}

/// Item routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/low-stock", get(handlers::list_low_stock))
        .route("/:item_id", get(handlers::get_item))
        .route("/:item_id/stock", get(handlers::get_item_stock))
        .route("/:item_id/recompute", post(handlers::recompute_item_stock))
        .route("/:item_id/batches", get(handlers::list_available_batches))
        .route("/:item_id/batches/all", get(handlers::list_all_batches))
}

/// Batch ledger routes
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_batch))
        .route("/:batch_id", get(handlers::get_batch))
}

/// Movement routes
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::record_movement),
        )
        .route(
            "/:movement_id",
            get(handlers::get_movement).delete(handlers::delete_movement),
        )
        .route("/:movement_id/lines", put(handlers::replace_movement_lines))
}

/// Job routes
fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_jobs).post(handlers::create_job))
        .route("/:job_id", get(handlers::get_job))
        .route("/:job_id/material-cost", get(handlers::get_material_cost))
        .route("/:job_id/movements", get(handlers::list_job_movements))
        .route("/:job_id/prices", get(handlers::list_fictitious_prices))
        .route(
            "/:job_id/prices/:item_id",
            put(handlers::set_fictitious_price).delete(handlers::remove_fictitious_price),
        )
}

/// Stock routes
fn stock_routes() -> Router<AppState> {
    Router::new().route("/reconciliation", get(handlers::get_stock_reconciliation))
}
