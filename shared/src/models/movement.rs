//! Delivery-note movements and their ledger effect
//!
//! A movement is one delivery-note transaction (entry, exit, or sale) made
//! of one or more lines. Direction is carried by the movement kind; line
//! quantities are always strictly positive.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of delivery-note transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Entry,
    Exit,
    Sale,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "entry",
            MovementKind::Exit => "exit",
            MovementKind::Sale => "sale",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(MovementKind::Entry),
            "exit" => Some(MovementKind::Exit),
            "sale" => Some(MovementKind::Sale),
            _ => None,
        }
    }

    /// Entries replenish stock; exits and sales consume it.
    pub fn consumes_stock(&self) -> bool {
        matches!(self, MovementKind::Exit | MovementKind::Sale)
    }
}

/// Committed delivery-note header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub kind: MovementKind,
    pub document_number: String,
    pub date: NaiveDate,
    /// Job the material is attributed to, when any
    pub job_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Committed line of a movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementLine {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub item_id: Uuid,
    /// Base-unit amount moved; always positive, direction comes from the kind
    pub quantity: Decimal,
    pub pieces: Option<Decimal>,
    /// None only on fictitious lines
    pub batch_id: Option<Uuid>,
    /// Billing-only line with no physical stock effect
    pub is_fictitious: bool,
    /// Price resolved at recording time; later override edits never touch it
    pub unit_price_at_movement: Decimal,
    /// Resolved price was zero where one was expected; flagged for review
    pub price_missing: bool,
    pub line_no: i32,
}

/// Line input for recording a movement.
///
/// The two recording paths are distinct variants so they are handled
/// exhaustively: a real line moves physical stock against a lot, a
/// fictitious line is billing-only and never touches batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineInput {
    Real {
        item_id: Uuid,
        /// Required on exit/sale. On entries: present = return to lot,
        /// absent = fresh receipt creating a new batch.
        batch_id: Option<Uuid>,
        quantity: Option<Decimal>,
        pieces: Option<Decimal>,
        /// Purchase cost per base unit; only meaningful on fresh-receipt
        /// entries, where it becomes the new batch's unit price.
        unit_price: Option<Decimal>,
    },
    Fictitious {
        item_id: Uuid,
        quantity: Decimal,
    },
}

impl LineInput {
    pub fn item_id(&self) -> Uuid {
        match self {
            LineInput::Real { item_id, .. } => *item_id,
            LineInput::Fictitious { item_id, .. } => *item_id,
        }
    }

    pub fn is_fictitious(&self) -> bool {
        matches!(self, LineInput::Fictitious { .. })
    }
}

/// Resolve the unit price to record on a line.
///
/// A job-negotiated fictitious price wins over the batch purchase cost even
/// on real stock. When neither is available the price resolves to zero and
/// the line is flagged for manual review rather than rejected — purchase
/// documents sometimes genuinely lack pricing.
pub fn resolve_unit_price(
    override_price: Option<Decimal>,
    batch_price: Option<Decimal>,
) -> (Decimal, bool) {
    let price = override_price
        .or(batch_price)
        .unwrap_or(Decimal::ZERO);
    (price, price == Decimal::ZERO)
}

/// Signed on-hand effect of one committed line.
///
/// Fictitious lines are billing-only and never move physical stock.
pub fn stock_effect(kind: MovementKind, is_fictitious: bool, quantity: Decimal) -> Decimal {
    if is_fictitious {
        Decimal::ZERO
    } else if kind.consumes_stock() {
        -quantity
    } else {
        quantity
    }
}

/// Reference on-hand projection: fold the stock effect over committed lines.
///
/// The SQL projection in the backend must agree with this fold for any
/// committed history; it is also what reconciliation replays.
pub fn project_on_hand<'a, I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (MovementKind, &'a MovementLine)>,
{
    lines
        .into_iter()
        .map(|(kind, line)| stock_effect(kind, line.is_fictitious, line.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(quantity: Decimal, is_fictitious: bool) -> MovementLine {
        MovementLine {
            id: Uuid::new_v4(),
            movement_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            quantity,
            pieces: None,
            batch_id: None,
            is_fictitious,
            unit_price_at_movement: Decimal::ZERO,
            price_missing: false,
            line_no: 1,
        }
    }

    #[test]
    fn override_wins_over_batch_cost() {
        let (price, missing) = resolve_unit_price(Some(dec("12.50")), Some(dec("9.00")));
        assert_eq!(price, dec("12.50"));
        assert!(!missing);
    }

    #[test]
    fn batch_cost_used_without_override() {
        let (price, missing) = resolve_unit_price(None, Some(dec("9.00")));
        assert_eq!(price, dec("9.00"));
        assert!(!missing);
    }

    #[test]
    fn missing_price_resolves_to_zero_and_flags() {
        let (price, missing) = resolve_unit_price(None, None);
        assert_eq!(price, Decimal::ZERO);
        assert!(missing);
    }

    #[test]
    fn fictitious_lines_have_no_stock_effect() {
        assert_eq!(
            stock_effect(MovementKind::Exit, true, dec("10")),
            Decimal::ZERO
        );
    }

    #[test]
    fn entries_add_and_exits_subtract() {
        assert_eq!(stock_effect(MovementKind::Entry, false, dec("10")), dec("10"));
        assert_eq!(stock_effect(MovementKind::Exit, false, dec("10")), dec("-10"));
        assert_eq!(stock_effect(MovementKind::Sale, false, dec("4")), dec("-4"));
    }

    #[test]
    fn projection_folds_committed_history() {
        let entry = line(dec("100"), false);
        let exit = line(dec("30"), false);
        let billing_only = line(dec("500"), true);
        let history = vec![
            (MovementKind::Entry, &entry),
            (MovementKind::Exit, &exit),
            (MovementKind::Sale, &billing_only),
        ];
        assert_eq!(project_on_hand(history), dec("70"));
    }
}
