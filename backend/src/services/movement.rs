//! Movement recorder
//!
//! Turns delivery-note transactions (entries, exits, sales) into committed
//! ledger rows: a header plus its lines, each line's batch effect and
//! resolved price applied in the same database transaction. A movement is
//! all-or-nothing; a single bad line rolls the whole document back, so the
//! stock projection never sees a partially applied transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::{
    resolve_unit_price, stock_effect, validate_line_quantity, BatchDraw, LedgerError, LineInput,
    Movement, MovementKind, MovementLine,
};

use crate::error::{AppError, AppResult};
use crate::services::batch::{create_batch_in_tx, deplete_locked, lock_batch, restock_locked};
use crate::services::item::{adjust_on_hand, fetch_coefficient};
use crate::services::pricing::resolve_in_tx;

/// Movement recording service
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
}

/// Input for recording a movement
#[derive(Debug, Deserialize)]
pub struct RecordMovementInput {
    /// Client-suppliable id; retrying with the same id never applies twice
    pub movement_id: Option<Uuid>,
    pub kind: MovementKind,
    pub document_number: String,
    pub date: Option<NaiveDate>,
    pub job_id: Option<Uuid>,
    pub notes: Option<String>,
    pub lines: Vec<LineInput>,
}

/// A committed movement together with its lines
#[derive(Debug, Clone, Serialize)]
pub struct MovementWithLines {
    #[serde(flatten)]
    pub movement: Movement,
    pub lines: Vec<MovementLine>,
}

/// Result of recording (or replaying) a movement
#[derive(Debug, Serialize)]
pub struct MovementResult {
    #[serde(flatten)]
    pub movement: MovementWithLines,
    /// True when this id was already committed and nothing was re-applied
    pub already_committed: bool,
    /// Lines that need a human look (e.g. a price that resolved to zero)
    pub review_flags: Vec<ReviewFlag>,
}

/// A committed line flagged for manual review
#[derive(Debug, Clone, Serialize)]
pub struct ReviewFlag {
    pub line_no: i32,
    pub item_id: Uuid,
    pub reason: String,
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    kind: String,
    document_number: String,
    date: NaiveDate,
    job_id: Option<Uuid>,
    notes: Option<String>,
    created_at: chrono::DateTime<Utc>,
}

impl TryFrom<MovementRow> for Movement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let kind = MovementKind::from_str(&row.kind)
            .ok_or_else(|| anyhow::anyhow!("unknown movement kind: {}", row.kind))?;
        Ok(Self {
            id: row.id,
            kind,
            document_number: row.document_number,
            date: row.date,
            job_id: row.job_id,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: Uuid,
    movement_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
    pieces: Option<Decimal>,
    batch_id: Option<Uuid>,
    is_fictitious: bool,
    unit_price_at_movement: Decimal,
    price_missing: bool,
    line_no: i32,
}

impl From<LineRow> for MovementLine {
    fn from(row: LineRow) -> Self {
        Self {
            id: row.id,
            movement_id: row.movement_id,
            item_id: row.item_id,
            quantity: row.quantity,
            pieces: row.pieces,
            batch_id: row.batch_id,
            is_fictitious: row.is_fictitious,
            unit_price_at_movement: row.unit_price_at_movement,
            price_missing: row.price_missing,
            line_no: row.line_no,
        }
    }
}

const MOVEMENT_COLUMNS: &str = "id, kind, document_number, date, job_id, notes, created_at";
const LINE_COLUMNS: &str = "id, movement_id, item_id, quantity, pieces, batch_id, \
     is_fictitious, unit_price_at_movement, price_missing, line_no";

/// Validate one line, apply its batch and stock effect, and insert it.
async fn apply_line(
    conn: &mut PgConnection,
    movement: &Movement,
    line_no: i32,
    input: &LineInput,
) -> AppResult<MovementLine> {
    let (item_id, quantity, pieces, batch_id, is_fictitious, unit_price, price_missing) =
        match input {
            LineInput::Fictitious { item_id, quantity } => {
                validate_line_quantity(*quantity)?;
                // Billing-only: no batch interaction, no stock effect. Price
                // comes from the override map when the job has one, else 0.
                let override_price = resolve_in_tx(conn, movement.job_id, *item_id).await?;
                let (price, missing) = resolve_unit_price(override_price, None);
                (*item_id, *quantity, None, None, true, price, missing)
            }
            LineInput::Real {
                item_id,
                batch_id,
                quantity,
                pieces,
                unit_price,
            } => {
                let coefficient = fetch_coefficient(conn, *item_id).await?;
                let draw = BatchDraw {
                    quantity: *quantity,
                    pieces: *pieces,
                };
                let (resolved_quantity, resolved_pieces) = draw.resolve(coefficient)?;

                if movement.kind.consumes_stock() {
                    let batch_id = batch_id.ok_or(LedgerError::MissingBatch)?;
                    let batch = lock_batch(conn, batch_id).await?;
                    if batch.item_id != *item_id {
                        return Err(AppError::Validation {
                            field: "batch_id".to_string(),
                            message: "Batch belongs to a different item".to_string(),
                        });
                    }
                    deplete_locked(conn, &batch, &draw, coefficient).await?;

                    // Job-negotiated pricing overrides actual cost when present
                    let override_price = resolve_in_tx(conn, movement.job_id, *item_id).await?;
                    let (price, missing) =
                        resolve_unit_price(override_price, Some(batch.unit_price));
                    (
                        *item_id,
                        resolved_quantity,
                        resolved_pieces,
                        Some(batch_id),
                        false,
                        price,
                        missing,
                    )
                } else {
                    // Entry: return to an existing lot, or a fresh receipt
                    // that opens a new one sized to the line.
                    let (bound_batch_id, batch_price) = match batch_id {
                        Some(batch_id) => {
                            let batch = lock_batch(conn, *batch_id).await?;
                            if batch.item_id != *item_id {
                                return Err(AppError::Validation {
                                    field: "batch_id".to_string(),
                                    message: "Batch belongs to a different item".to_string(),
                                });
                            }
                            restock_locked(conn, &batch, &draw, coefficient).await?;
                            (*batch_id, batch.unit_price)
                        }
                        None => {
                            let price = unit_price.unwrap_or(Decimal::ZERO);
                            if price < Decimal::ZERO {
                                return Err(AppError::Validation {
                                    field: "unit_price".to_string(),
                                    message: "Unit price cannot be negative".to_string(),
                                });
                            }
                            let received_at = movement.date.and_time(chrono::NaiveTime::MIN).and_utc();
                            let batch = create_batch_in_tx(
                                conn,
                                *item_id,
                                resolved_quantity,
                                resolved_pieces,
                                price,
                                received_at,
                                &movement.document_number,
                            )
                            .await?;
                            (batch.id, batch.unit_price)
                        }
                    };
                    let (price, missing) = resolve_unit_price(None, Some(batch_price));
                    (
                        *item_id,
                        resolved_quantity,
                        resolved_pieces,
                        Some(bound_batch_id),
                        false,
                        price,
                        missing,
                    )
                }
            }
        };

    let row = sqlx::query_as::<_, LineRow>(&format!(
        r#"
        INSERT INTO movement_lines (movement_id, item_id, quantity, pieces, batch_id,
                                    is_fictitious, unit_price_at_movement, price_missing, line_no)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {LINE_COLUMNS}
        "#,
    ))
    .bind(movement.id)
    .bind(item_id)
    .bind(quantity)
    .bind(pieces)
    .bind(batch_id)
    .bind(is_fictitious)
    .bind(unit_price)
    .bind(price_missing)
    .bind(line_no)
    .fetch_one(&mut *conn)
    .await?;

    adjust_on_hand(
        conn,
        item_id,
        stock_effect(movement.kind, is_fictitious, quantity),
    )
    .await?;

    Ok(row.into())
}

/// Undo the batch and stock effects of committed lines (for replace/delete).
async fn reverse_lines(
    conn: &mut PgConnection,
    movement: &Movement,
    lines: &[MovementLine],
) -> AppResult<()> {
    for line in lines {
        if line.is_fictitious {
            continue;
        }
        let batch_id = line
            .batch_id
            .ok_or_else(|| anyhow::anyhow!("real line {} has no batch", line.id))?;
        let coefficient = fetch_coefficient(conn, line.item_id).await?;
        let batch = lock_batch(conn, batch_id).await?;
        let draw = BatchDraw {
            quantity: Some(line.quantity),
            pieces: line.pieces,
        };
        if movement.kind.consumes_stock() {
            restock_locked(conn, &batch, &draw, coefficient).await?;
        } else {
            // Undoing an entry drains what it put in; fails if the lot has
            // been consumed by later exits in the meantime.
            deplete_locked(conn, &batch, &draw, coefficient).await?;
        }
        adjust_on_hand(
            conn,
            line.item_id,
            -stock_effect(movement.kind, false, line.quantity),
        )
        .await?;
    }
    Ok(())
}

/// Result for a movement id that is already committed: the stored state
/// comes back untouched, marked so the caller knows nothing was re-applied.
fn replay_outcome(committed: MovementWithLines) -> MovementResult {
    let review_flags = review_flags(&committed.lines);
    MovementResult {
        movement: committed,
        already_committed: true,
        review_flags,
    }
}

fn review_flags(lines: &[MovementLine]) -> Vec<ReviewFlag> {
    lines
        .iter()
        .filter(|line| line.price_missing)
        .map(|line| ReviewFlag {
            line_no: line.line_no,
            item_id: line.item_id,
            reason: "missing_price".to_string(),
        })
        .collect()
}

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a movement atomically: either every line validates and
    /// applies, or none do.
    ///
    /// Recording an id that is already committed is a replay (retried
    /// request); the committed state is returned untouched.
    pub async fn record(&self, input: RecordMovementInput) -> AppResult<MovementResult> {
        if input.lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A movement needs at least one line".to_string(),
            });
        }
        if input.document_number.trim().is_empty() {
            return Err(AppError::Validation {
                field: "document_number".to_string(),
                message: "Document number cannot be empty".to_string(),
            });
        }

        let movement_id = input.movement_id.unwrap_or_else(Uuid::new_v4);
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        if let Some(job_id) = input.job_id {
            let job_exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1)")
                    .bind(job_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !job_exists {
                return Err(AppError::NotFound("Job".to_string()));
            }
        }

        let inserted = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            INSERT INTO movements (id, kind, document_number, date, job_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            RETURNING {MOVEMENT_COLUMNS}
            "#,
        ))
        .bind(movement_id)
        .bind(input.kind.as_str())
        .bind(input.document_number.trim())
        .bind(date)
        .bind(input.job_id)
        .bind(&input.notes)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = inserted else {
            // At-most-once application per movement id
            tx.rollback().await?;
            tracing::info!(%movement_id, "movement already committed, replay ignored");
            let committed = self.get(movement_id).await?;
            return Ok(replay_outcome(committed));
        };
        let movement = Movement::try_from(row)?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for (index, line_input) in input.lines.iter().enumerate() {
            let line = apply_line(&mut tx, &movement, index as i32 + 1, line_input).await?;
            lines.push(line);
        }

        tx.commit().await?;

        tracing::info!(
            %movement_id,
            kind = movement.kind.as_str(),
            lines = lines.len(),
            "movement committed"
        );

        let flags = review_flags(&lines);
        Ok(MovementResult {
            movement: MovementWithLines { movement, lines },
            already_committed: false,
            review_flags: flags,
        })
    }

    /// Replace the whole line set of a committed movement.
    ///
    /// The old lines' batch effects are reversed and the new lines applied
    /// inside one transaction, so batch remainders are diff-validated and no
    /// transient over-depletion is ever visible.
    pub async fn replace_lines(
        &self,
        movement_id: Uuid,
        new_lines: Vec<LineInput>,
    ) -> AppResult<MovementResult> {
        if new_lines.is_empty() {
            return Err(AppError::Validation {
                field: "lines".to_string(),
                message: "A movement needs at least one line".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = $1 FOR UPDATE"
        ))
        .bind(movement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;
        let movement = Movement::try_from(row)?;

        let old_lines = fetch_lines(&mut tx, movement_id).await?;
        reverse_lines(&mut tx, &movement, &old_lines).await?;

        sqlx::query("DELETE FROM movement_lines WHERE movement_id = $1")
            .bind(movement_id)
            .execute(&mut *tx)
            .await?;

        let mut lines = Vec::with_capacity(new_lines.len());
        for (index, line_input) in new_lines.iter().enumerate() {
            let line = apply_line(&mut tx, &movement, index as i32 + 1, line_input).await?;
            lines.push(line);
        }

        tx.commit().await?;

        tracing::info!(%movement_id, lines = lines.len(), "movement lines replaced");

        let flags = review_flags(&lines);
        Ok(MovementResult {
            movement: MovementWithLines { movement, lines },
            already_committed: false,
            review_flags: flags,
        })
    }

    /// Delete a movement, reversing every batch and stock effect it applied.
    pub async fn delete(&self, movement_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = $1 FOR UPDATE"
        ))
        .bind(movement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;
        let movement = Movement::try_from(row)?;

        let old_lines = fetch_lines(&mut tx, movement_id).await?;
        reverse_lines(&mut tx, &movement, &old_lines).await?;

        sqlx::query("DELETE FROM movements WHERE id = $1")
            .bind(movement_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%movement_id, "movement deleted");

        Ok(())
    }

    /// Get a committed movement with its lines
    pub async fn get(&self, movement_id: Uuid) -> AppResult<MovementWithLines> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = $1"
        ))
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;
        let movement = Movement::try_from(row)?;

        let lines = sqlx::query_as::<_, LineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM movement_lines WHERE movement_id = $1 ORDER BY line_no"
        ))
        .bind(movement_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(MovementLine::from)
        .collect();

        Ok(MovementWithLines { movement, lines })
    }

    /// List movement headers, newest document first
    pub async fn list(&self) -> AppResult<Vec<Movement>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements ORDER BY date DESC, created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Movement::try_from).collect()
    }

    /// List movement headers attributed to a job
    pub async fn list_for_job(&self, job_id: Uuid) -> AppResult<Vec<Movement>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE job_id = $1 ORDER BY date DESC, created_at DESC"
        ))
        .bind(job_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Movement::try_from).collect()
    }
}

async fn fetch_lines(conn: &mut PgConnection, movement_id: Uuid) -> AppResult<Vec<MovementLine>> {
    let rows = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM movement_lines WHERE movement_id = $1 ORDER BY line_no"
    ))
    .bind(movement_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(MovementLine::from).collect())
}
