//! HTTP handlers for jobs, material cost, and fictitious pricing

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{FictitiousPrice, Job, JobMaterialCost, Movement};
use crate::services::job::CreateJobInput;
use crate::services::{JobCostService, JobService, MovementService, PricingService};
use crate::AppState;

/// Create a job
pub async fn create_job(
    State(state): State<AppState>,
    Json(input): Json<CreateJobInput>,
) -> AppResult<Json<Job>> {
    let service = JobService::new(state.db);
    let job = service.create_job(input).await?;
    Ok(Json(job))
}

/// List all jobs
pub async fn list_jobs(State(state): State<AppState>) -> AppResult<Json<Vec<Job>>> {
    let service = JobService::new(state.db);
    let jobs = service.list_jobs().await?;
    Ok(Json(jobs))
}

/// Get a job
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<Job>> {
    let service = JobService::new(state.db);
    let job = service.get_job(job_id).await?;
    Ok(Json(job))
}

/// Get the material cost total for a job
pub async fn get_material_cost(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<JobMaterialCost>> {
    let service = JobCostService::new(state.db);
    let cost = service.material_cost(job_id).await?;
    Ok(Json(cost))
}

/// List movements attributed to a job
pub async fn list_job_movements(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<Vec<Movement>>> {
    let service = MovementService::new(state.db);
    let movements = service.list_for_job(job_id).await?;
    Ok(Json(movements))
}

/// Body for setting a fictitious price
#[derive(Debug, Deserialize)]
pub struct SetPriceInput {
    pub price: Decimal,
}

/// Upsert the billing rate for (job, item)
pub async fn set_fictitious_price(
    State(state): State<AppState>,
    Path((job_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<SetPriceInput>,
) -> AppResult<Json<FictitiousPrice>> {
    let service = PricingService::new(state.db);
    let price = service.set_price(job_id, item_id, input.price).await?;
    Ok(Json(price))
}

/// Remove the billing rate for (job, item)
pub async fn remove_fictitious_price(
    State(state): State<AppState>,
    Path((job_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<()>> {
    let service = PricingService::new(state.db);
    service.remove_price(job_id, item_id).await?;
    Ok(Json(()))
}

/// List the fictitious prices configured for a job
pub async fn list_fictitious_prices(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<Vec<FictitiousPrice>>> {
    let service = PricingService::new(state.db);
    let prices = service.list_for_job(job_id).await?;
    Ok(Json(prices))
}
