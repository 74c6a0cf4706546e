//! Job material cost aggregator
//!
//! Sums committed exit/sale lines at the price resolved when they were
//! recorded, so a job's historical cost never shifts when an override is
//! edited later. The raw total is exposed without redaction; who gets to
//! see it is the caller's concern.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::JobMaterialCost;

use crate::error::{AppError, AppResult};

/// Job cost aggregation service
#[derive(Clone)]
pub struct JobCostService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct CostRow {
    total: Decimal,
    line_count: i64,
    missing_price_lines: i64,
}

impl JobCostService {
    /// Create a new JobCostService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Material cost of a job over all committed exit/sale lines.
    ///
    /// Lines whose price resolved to zero still sum (as zero) and are
    /// reported in `missing_price_lines` instead of failing the total.
    pub async fn material_cost(&self, job_id: Uuid) -> AppResult<JobMaterialCost> {
        let job_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1)")
                .bind(job_id)
                .fetch_one(&self.db)
                .await?;
        if !job_exists {
            return Err(AppError::NotFound("Job".to_string()));
        }

        let row = sqlx::query_as::<_, CostRow>(
            r#"
            SELECT COALESCE(SUM(ml.quantity * ml.unit_price_at_movement), 0) AS total,
                   COUNT(ml.id) AS line_count,
                   COUNT(ml.id) FILTER (WHERE ml.price_missing) AS missing_price_lines
            FROM movement_lines ml
            JOIN movements m ON m.id = ml.movement_id
            WHERE m.job_id = $1 AND m.kind IN ('exit', 'sale')
            "#,
        )
        .bind(job_id)
        .fetch_one(&self.db)
        .await?;

        Ok(JobMaterialCost {
            job_id,
            total: row.total,
            line_count: row.line_count,
            missing_price_lines: row.missing_price_lines,
        })
    }
}
