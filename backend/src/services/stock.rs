//! Stock projector
//!
//! On-hand quantity is a pure function of the committed movement history:
//! entry lines add, exit/sale lines subtract, fictitious lines never count.
//! The cached counter on the item row is maintained incrementally by the
//! recorder; this service exposes both the cache and the full replay, and a
//! reconciliation pass that compares the two.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{classify_stock, StockStatus};

use crate::error::{AppError, AppResult};

/// Stock projection service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Stock position of an item
#[derive(Debug, Clone, Serialize)]
pub struct ItemStock {
    pub item_id: Uuid,
    pub code: String,
    pub on_hand: Decimal,
    pub min_stock: Decimal,
    pub status: StockStatus,
}

/// Cache-versus-replay comparison for one item
#[derive(Debug, Clone, Serialize)]
pub struct StockDrift {
    pub item_id: Uuid,
    pub code: String,
    pub cached: Decimal,
    pub projected: Decimal,
    pub drift: Decimal,
}

#[derive(Debug, FromRow)]
struct StockRow {
    id: Uuid,
    code: String,
    on_hand: Decimal,
    min_stock: Decimal,
}

#[derive(Debug, FromRow)]
struct DriftRow {
    id: Uuid,
    code: String,
    on_hand: Decimal,
    projected: Decimal,
}

/// Full-replay projection over non-fictitious committed lines.
const PROJECTION_SQL: &str = r#"
    SELECT COALESCE(SUM(
        CASE WHEN m.kind = 'entry' THEN ml.quantity ELSE -ml.quantity END
    ), 0)
    FROM movement_lines ml
    JOIN movements m ON m.id = ml.movement_id
    WHERE ml.item_id = $1 AND NOT ml.is_fictitious
"#;

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current on-hand quantity and classification (cached counter)
    pub async fn stock(&self, item_id: Uuid) -> AppResult<ItemStock> {
        let row = sqlx::query_as::<_, StockRow>(
            "SELECT id, code, on_hand, min_stock FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        Ok(ItemStock {
            item_id: row.id,
            code: row.code,
            on_hand: row.on_hand,
            min_stock: row.min_stock,
            status: classify_stock(row.on_hand, row.min_stock),
        })
    }

    /// Current on-hand quantity (cached counter)
    pub async fn on_hand(&self, item_id: Uuid) -> AppResult<Decimal> {
        Ok(self.stock(item_id).await?.on_hand)
    }

    /// Stock classification against the reorder threshold
    pub async fn classify(&self, item_id: Uuid) -> AppResult<StockStatus> {
        Ok(self.stock(item_id).await?.status)
    }

    /// Recompute on-hand by replaying the whole committed history.
    ///
    /// Must agree with the cached counter; used for audit and as the ground
    /// truth when they diverge.
    pub async fn project_on_hand(&self, item_id: Uuid) -> AppResult<Decimal> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let projected = sqlx::query_scalar::<_, Decimal>(PROJECTION_SQL)
            .bind(item_id)
            .fetch_one(&self.db)
            .await?;

        Ok(projected)
    }

    /// Overwrite the cached counter with the full-replay value.
    pub async fn recompute(&self, item_id: Uuid) -> AppResult<ItemStock> {
        let projected = self.project_on_hand(item_id).await?;

        sqlx::query("UPDATE items SET on_hand = $1, updated_at = now() WHERE id = $2")
            .bind(projected)
            .bind(item_id)
            .execute(&self.db)
            .await?;

        self.stock(item_id).await
    }

    /// Compare the cached counter against the replay for every item and
    /// report the ones that drifted.
    pub async fn reconcile(&self) -> AppResult<Vec<StockDrift>> {
        let rows = sqlx::query_as::<_, DriftRow>(
            r#"
            SELECT i.id, i.code, i.on_hand,
                   COALESCE(SUM(
                       CASE WHEN m.kind = 'entry' THEN ml.quantity ELSE -ml.quantity END
                   ) FILTER (WHERE NOT ml.is_fictitious), 0) AS projected
            FROM items i
            LEFT JOIN movement_lines ml ON ml.item_id = i.id
            LEFT JOIN movements m ON m.id = ml.movement_id
            GROUP BY i.id, i.code, i.on_hand
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .filter(|row| row.on_hand != row.projected)
            .map(|row| StockDrift {
                item_id: row.id,
                code: row.code,
                cached: row.on_hand,
                projected: row.projected,
                drift: row.on_hand - row.projected,
            })
            .collect())
    }
}
