//! Fictitious price override map
//!
//! Per (job, item) billing rates. When present, the override wins over the
//! actual batch cost at recording time; absent means absent, there is no
//! defaulting or inheritance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::{validate_override_price, FictitiousPrice};

use crate::error::{AppError, AppResult};

/// Fictitious price service
#[derive(Clone)]
pub struct PricingService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct PriceRow {
    job_id: Uuid,
    item_id: Uuid,
    price: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<PriceRow> for FictitiousPrice {
    fn from(row: PriceRow) -> Self {
        Self {
            job_id: row.job_id,
            item_id: row.item_id,
            price: row.price,
            updated_at: row.updated_at,
        }
    }
}

/// Look up the override for (job, item) inside an open transaction.
pub(crate) async fn resolve_in_tx(
    conn: &mut PgConnection,
    job_id: Option<Uuid>,
    item_id: Uuid,
) -> AppResult<Option<Decimal>> {
    let Some(job_id) = job_id else {
        return Ok(None);
    };
    let price = sqlx::query_scalar::<_, Decimal>(
        "SELECT price FROM fictitious_prices WHERE job_id = $1 AND item_id = $2",
    )
    .bind(job_id)
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(price)
}

impl PricingService {
    /// Create a new PricingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Upsert the billing rate for (job, item)
    pub async fn set_price(
        &self,
        job_id: Uuid,
        item_id: Uuid,
        price: Decimal,
    ) -> AppResult<FictitiousPrice> {
        validate_override_price(price)?;

        let job_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1)")
                .bind(job_id)
                .fetch_one(&self.db)
                .await?;
        if !job_exists {
            return Err(AppError::NotFound("Job".to_string()));
        }

        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;
        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let row = sqlx::query_as::<_, PriceRow>(
            r#"
            INSERT INTO fictitious_prices (job_id, item_id, price)
            VALUES ($1, $2, $3)
            ON CONFLICT (job_id, item_id)
            DO UPDATE SET price = EXCLUDED.price, updated_at = now()
            RETURNING job_id, item_id, price, updated_at
            "#,
        )
        .bind(job_id)
        .bind(item_id)
        .bind(price)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Remove the billing rate for (job, item); removing an absent entry is
    /// not an error.
    pub async fn remove_price(&self, job_id: Uuid, item_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM fictitious_prices WHERE job_id = $1 AND item_id = $2")
            .bind(job_id)
            .bind(item_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Plain lookup; `None` when no override is set
    pub async fn resolve_price(&self, job_id: Uuid, item_id: Uuid) -> AppResult<Option<Decimal>> {
        let price = sqlx::query_scalar::<_, Decimal>(
            "SELECT price FROM fictitious_prices WHERE job_id = $1 AND item_id = $2",
        )
        .bind(job_id)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(price)
    }

    /// List the overrides configured for a job
    pub async fn list_for_job(&self, job_id: Uuid) -> AppResult<Vec<FictitiousPrice>> {
        let rows = sqlx::query_as::<_, PriceRow>(
            "SELECT job_id, item_id, price, updated_at FROM fictitious_prices WHERE job_id = $1 ORDER BY item_id",
        )
        .bind(job_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(FictitiousPrice::from).collect())
    }
}
