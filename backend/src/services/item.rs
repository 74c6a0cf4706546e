//! Item master data service
//!
//! The ledger consumes item records (code, unit, coefficient, reorder
//! threshold); everything else about articles lives in the surrounding
//! application.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::{classify_stock, validate_coefficient, validate_item_code, Item, StockStatus};

use crate::error::{AppError, AppResult};

/// Item service for managing article master data
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// Input for creating an item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub code: String,
    pub name: String,
    pub unit: Option<String>,
    pub coefficient: Option<Decimal>,
    pub min_stock: Option<Decimal>,
}

/// Item with its stock classification
#[derive(Debug, Clone, Serialize)]
pub struct ItemWithStatus {
    #[serde(flatten)]
    pub item: Item,
    pub status: StockStatus,
}

#[derive(Debug, FromRow)]
pub(crate) struct ItemRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub coefficient: Decimal,
    pub min_stock: Decimal,
    pub on_hand: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            unit: row.unit,
            coefficient: row.coefficient,
            min_stock: row.min_stock,
            on_hand: row.on_hand,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ITEM_COLUMNS: &str =
    "id, code, name, unit, coefficient, min_stock, on_hand, created_at, updated_at";

/// Fetch the coefficient of an item inside an open transaction.
pub(crate) async fn fetch_coefficient(
    conn: &mut PgConnection,
    item_id: Uuid,
) -> AppResult<Decimal> {
    sqlx::query_scalar::<_, Decimal>("SELECT coefficient FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
}

/// Adjust the cached on-hand counter inside an open transaction.
pub(crate) async fn adjust_on_hand(
    conn: &mut PgConnection,
    item_id: Uuid,
    delta: Decimal,
) -> AppResult<()> {
    if delta == Decimal::ZERO {
        return Ok(());
    }
    sqlx::query("UPDATE items SET on_hand = on_hand + $1, updated_at = now() WHERE id = $2")
        .bind(delta)
        .bind(item_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an item
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<Item> {
        let code = input.code.trim().to_uppercase();
        if let Err(message) = validate_item_code(&code) {
            return Err(AppError::Validation {
                field: "code".to_string(),
                message: message.to_string(),
            });
        }

        let coefficient = input.coefficient.unwrap_or(Decimal::ONE);
        validate_coefficient(coefficient)?;

        let min_stock = input.min_stock.unwrap_or(Decimal::ZERO);
        if min_stock < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "min_stock".to_string(),
                message: "Reorder threshold cannot be negative".to_string(),
            });
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM items WHERE code = $1)",
        )
        .bind(&code)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO items (code, name, unit, coefficient, min_stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ITEM_COLUMNS}
            "#,
        ))
        .bind(&code)
        .bind(input.name.trim())
        .bind(input.unit.as_deref().unwrap_or("pz"))
        .bind(coefficient)
        .bind(min_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get an item by id
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        Ok(row.into())
    }

    /// List all items ordered by code
    pub async fn list_items(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY code"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// List items at or below their reorder threshold
    pub async fn list_low_stock(&self) -> AppResult<Vec<ItemWithStatus>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE on_hand <= min_stock ORDER BY code"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let item = Item::from(row);
                let status = classify_stock(item.on_hand, item.min_stock);
                ItemWithStatus { item, status }
            })
            .collect())
    }
}
