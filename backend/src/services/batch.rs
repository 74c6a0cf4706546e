//! Batch (lot) ledger service
//!
//! Authoritative source for how much of each purchased lot is left.
//! Remainder arithmetic lives in `shared::models::batch`; this service wraps
//! it in row-locked transactions so concurrent depletions of the same lot
//! serialize on the database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::{
    apply_depletion, apply_restock, exhausted_epsilon, Batch, BatchDraw, BatchRemainder,
};

use crate::error::{AppError, AppResult};
use crate::services::item::fetch_coefficient;

/// Batch ledger service
#[derive(Clone)]
pub struct BatchLedgerService {
    db: PgPool,
}

/// Input for registering a purchased lot directly
#[derive(Debug, Deserialize)]
pub struct CreateBatchInput {
    pub item_id: Uuid,
    pub quantity: Option<Decimal>,
    pub pieces: Option<Decimal>,
    pub unit_price: Decimal,
    pub received_at: Option<DateTime<Utc>>,
    pub source_reference: String,
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    item_id: Uuid,
    original_quantity: Decimal,
    original_pieces: Option<Decimal>,
    remaining_quantity: Decimal,
    remaining_pieces: Option<Decimal>,
    unit_price: Decimal,
    received_at: DateTime<Utc>,
    source_reference: String,
    created_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Self {
            id: row.id,
            item_id: row.item_id,
            original_quantity: row.original_quantity,
            original_pieces: row.original_pieces,
            remaining_quantity: row.remaining_quantity,
            remaining_pieces: row.remaining_pieces,
            unit_price: row.unit_price,
            received_at: row.received_at,
            source_reference: row.source_reference,
            created_at: row.created_at,
        }
    }
}

const BATCH_COLUMNS: &str = "id, item_id, original_quantity, original_pieces, \
     remaining_quantity, remaining_pieces, unit_price, received_at, source_reference, created_at";

/// Fetch a batch row with a row-level lock, serializing concurrent draws.
pub(crate) async fn lock_batch(conn: &mut PgConnection, batch_id: Uuid) -> AppResult<Batch> {
    let row = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1 FOR UPDATE"
    ))
    .bind(batch_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

    Ok(row.into())
}

async fn write_remainder(
    conn: &mut PgConnection,
    batch_id: Uuid,
    remainder: &BatchRemainder,
) -> AppResult<()> {
    sqlx::query("UPDATE batches SET remaining_quantity = $1, remaining_pieces = $2 WHERE id = $3")
        .bind(remainder.remaining_quantity)
        .bind(remainder.remaining_pieces)
        .bind(batch_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Deplete an already-locked batch and persist the new remainders.
pub(crate) async fn deplete_locked(
    conn: &mut PgConnection,
    batch: &Batch,
    draw: &BatchDraw,
    coefficient: Decimal,
) -> AppResult<BatchRemainder> {
    let remainder = apply_depletion(batch, draw, coefficient)?;
    write_remainder(conn, batch.id, &remainder).await?;
    Ok(remainder)
}

/// Restock an already-locked batch and persist the new remainders.
pub(crate) async fn restock_locked(
    conn: &mut PgConnection,
    batch: &Batch,
    draw: &BatchDraw,
    coefficient: Decimal,
) -> AppResult<BatchRemainder> {
    let remainder = apply_restock(batch, draw, coefficient)?;
    write_remainder(conn, batch.id, &remainder).await?;
    Ok(remainder)
}

/// Create a batch row inside an open transaction (fresh receipt).
pub(crate) async fn create_batch_in_tx(
    conn: &mut PgConnection,
    item_id: Uuid,
    quantity: Decimal,
    pieces: Option<Decimal>,
    unit_price: Decimal,
    received_at: DateTime<Utc>,
    source_reference: &str,
) -> AppResult<Batch> {
    let row = sqlx::query_as::<_, BatchRow>(&format!(
        r#"
        INSERT INTO batches (item_id, original_quantity, original_pieces,
                             remaining_quantity, remaining_pieces, unit_price,
                             received_at, source_reference)
        VALUES ($1, $2, $3, $2, $3, $4, $5, $6)
        RETURNING {BATCH_COLUMNS}
        "#,
    ))
    .bind(item_id)
    .bind(quantity)
    .bind(pieces)
    .bind(unit_price)
    .bind(received_at)
    .bind(source_reference)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

impl BatchLedgerService {
    /// Create a new BatchLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a purchased lot. Remainders start equal to the originals;
    /// no other batch is touched.
    pub async fn create_batch(&self, input: CreateBatchInput) -> AppResult<Batch> {
        if input.unit_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price cannot be negative".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let coefficient = fetch_coefficient(&mut tx, input.item_id).await?;
        let draw = BatchDraw {
            quantity: input.quantity,
            pieces: input.pieces,
        };
        let (quantity, pieces) = draw.resolve(coefficient)?;

        let batch = create_batch_in_tx(
            &mut tx,
            input.item_id,
            quantity,
            pieces,
            input.unit_price,
            input.received_at.unwrap_or_else(Utc::now),
            &input.source_reference,
        )
        .await?;

        tx.commit().await?;

        Ok(batch)
    }

    /// Get a batch by id
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<Batch> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1"
        ))
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        Ok(row.into())
    }

    /// List lots of an item that still hold material, oldest received first.
    ///
    /// FIFO ordering is a suggestion for the picker; lot choice stays with
    /// the caller. Near-zero remainders count as exhausted.
    pub async fn list_available_batches(&self, item_id: Uuid) -> AppResult<Vec<Batch>> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches
            WHERE item_id = $1 AND remaining_quantity > $2
            ORDER BY received_at ASC, created_at ASC
            "#,
        ))
        .bind(item_id)
        .bind(exhausted_epsilon())
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Batch::from).collect())
    }

    /// List every lot of an item, exhausted ones included (audit view).
    pub async fn list_batches(&self, item_id: Uuid) -> AppResult<Vec<Batch>> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches
            WHERE item_id = $1
            ORDER BY received_at ASC, created_at ASC
            "#,
        ))
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Batch::from).collect())
    }

    /// Draw material from a lot outside of a movement (manual adjustment).
    pub async fn deplete(&self, batch_id: Uuid, draw: BatchDraw) -> AppResult<Batch> {
        let mut tx = self.db.begin().await?;

        let batch = lock_batch(&mut tx, batch_id).await?;
        let coefficient = fetch_coefficient(&mut tx, batch.item_id).await?;
        deplete_locked(&mut tx, &batch, &draw, coefficient).await?;

        tx.commit().await?;

        self.get_batch(batch_id).await
    }

    /// Return material to a lot outside of a movement (manual adjustment).
    pub async fn restock(&self, batch_id: Uuid, draw: BatchDraw) -> AppResult<Batch> {
        let mut tx = self.db.begin().await?;

        let batch = lock_batch(&mut tx, batch_id).await?;
        let coefficient = fetch_coefficient(&mut tx, batch.item_id).await?;
        restock_locked(&mut tx, &batch, &draw, coefficient).await?;

        tx.commit().await?;

        self.get_batch(batch_id).await
    }
}
