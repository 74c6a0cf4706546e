//! Purchased lot ("batch") tracking and depletion arithmetic
//!
//! Each batch is a single receipt of stock. Its original cost and remaining
//! amount are tracked separately from every other receipt so exits can be
//! attributed to the exact lot the material came from. Exhausted batches are
//! kept for audit, never deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::units::{pieces_to_quantity, quantity_to_pieces};

/// Tolerance for treating a near-zero remainder as exhausted, in base units.
/// Absorbs decimal dust from piece conversions on fractional coefficients.
pub fn exhausted_epsilon() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

/// A purchased lot of a single item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub item_id: Uuid,
    /// Base units received
    pub original_quantity: Decimal,
    /// Discrete packaging count received, when the document carried one
    pub original_pieces: Option<Decimal>,
    pub remaining_quantity: Decimal,
    pub remaining_pieces: Option<Decimal>,
    /// Cost per base unit at time of purchase
    pub unit_price: Decimal,
    pub received_at: DateTime<Utc>,
    /// Purchase document the lot originated from
    pub source_reference: String,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn is_exhausted(&self) -> bool {
        self.remaining_quantity <= exhausted_epsilon()
    }
}

/// Amount drawn from (or returned to) a batch, in whichever dimension the
/// source document was written in. At least one must be present.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchDraw {
    pub quantity: Option<Decimal>,
    pub pieces: Option<Decimal>,
}

impl BatchDraw {
    pub fn from_quantity(quantity: Decimal) -> Self {
        Self {
            quantity: Some(quantity),
            pieces: None,
        }
    }

    pub fn from_pieces(pieces: Decimal) -> Self {
        Self {
            quantity: None,
            pieces: Some(pieces),
        }
    }

    /// Resolve the draw to a strictly positive base-unit quantity, deriving
    /// the quantity through the item coefficient when only pieces were given.
    ///
    /// Returns `(quantity, pieces)`; pieces stays `None` when the caller
    /// supplied only a quantity.
    pub fn resolve(
        &self,
        coefficient: Decimal,
    ) -> Result<(Decimal, Option<Decimal>), LedgerError> {
        let (quantity, pieces) = match (self.quantity, self.pieces) {
            (Some(q), Some(p)) => (q, Some(p)),
            (Some(q), None) => (q, None),
            (None, Some(p)) => (pieces_to_quantity(p, coefficient)?, Some(p)),
            (None, None) => return Err(LedgerError::MissingDimension),
        };
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidQuantity);
        }
        if let Some(p) = pieces {
            if p <= Decimal::ZERO {
                return Err(LedgerError::InvalidQuantity);
            }
        }
        Ok((quantity, pieces))
    }
}

/// New remainders computed for a batch, ready to be written back
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRemainder {
    pub remaining_quantity: Decimal,
    pub remaining_pieces: Option<Decimal>,
}

/// Compute the remainders after drawing from a batch.
///
/// Fails with `InsufficientBatchQuantity` on overdraw of the supplied
/// dimension; the check is epsilon-tolerant so a lot can always be emptied
/// to exactly zero. The stored quantity and piece remainders may have
/// drifted apart (pieces sold by weight); depletion proceeds on the
/// dimension the caller supplied and recomputes the other through the
/// coefficient, restoring consistency.
pub fn apply_depletion(
    batch: &Batch,
    draw: &BatchDraw,
    coefficient: Decimal,
) -> Result<BatchRemainder, LedgerError> {
    let (quantity, pieces) = draw.resolve(coefficient)?;
    let eps = exhausted_epsilon();

    match (draw.quantity, batch.remaining_pieces) {
        // Piece-based draw against a piece-tracked lot: pieces lead.
        (None, Some(remaining_pieces)) => {
            let drawn_pieces = pieces.unwrap_or_default();
            // The tolerance is in base units; scale it before comparing pieces
            let piece_eps = eps / coefficient;
            if drawn_pieces > remaining_pieces + piece_eps {
                return Err(LedgerError::InsufficientBatchQuantity {
                    requested: quantity,
                    remaining: pieces_to_quantity(remaining_pieces, coefficient)?,
                });
            }
            let new_pieces = clamp_zero(remaining_pieces - drawn_pieces, piece_eps);
            Ok(BatchRemainder {
                remaining_quantity: pieces_to_quantity(new_pieces, coefficient)?,
                remaining_pieces: Some(new_pieces),
            })
        }
        // Quantity-based draw (or lot without piece tracking): quantity leads.
        _ => {
            if quantity > batch.remaining_quantity + eps {
                return Err(LedgerError::InsufficientBatchQuantity {
                    requested: quantity,
                    remaining: batch.remaining_quantity,
                });
            }
            let new_quantity = clamp_zero(batch.remaining_quantity - quantity, eps);
            let new_pieces = match batch.remaining_pieces {
                Some(_) => Some(quantity_to_pieces(new_quantity, coefficient)?),
                None => None,
            };
            Ok(BatchRemainder {
                remaining_quantity: new_quantity,
                remaining_pieces: new_pieces,
            })
        }
    }
}

/// Compute the remainders after returning material to a batch.
///
/// Used when an entry movement reverses an earlier exit. Fails with
/// `ExceedsOriginal` when the result would hold more than the lot ever
/// received.
pub fn apply_restock(
    batch: &Batch,
    draw: &BatchDraw,
    coefficient: Decimal,
) -> Result<BatchRemainder, LedgerError> {
    let (quantity, pieces) = draw.resolve(coefficient)?;
    let eps = exhausted_epsilon();

    match (draw.quantity, batch.remaining_pieces, batch.original_pieces) {
        (None, Some(remaining_pieces), Some(original_pieces)) => {
            let returned_pieces = pieces.unwrap_or_default();
            let new_pieces = remaining_pieces + returned_pieces;
            // Same base-unit tolerance, scaled into the pieces dimension
            let piece_eps = eps / coefficient;
            if new_pieces > original_pieces + piece_eps {
                return Err(LedgerError::ExceedsOriginal {
                    requested: pieces_to_quantity(new_pieces, coefficient)?,
                    capacity: batch.original_quantity,
                });
            }
            Ok(BatchRemainder {
                remaining_quantity: pieces_to_quantity(new_pieces, coefficient)?,
                remaining_pieces: Some(new_pieces),
            })
        }
        _ => {
            let new_quantity = batch.remaining_quantity + quantity;
            if new_quantity > batch.original_quantity + eps {
                return Err(LedgerError::ExceedsOriginal {
                    requested: new_quantity,
                    capacity: batch.original_quantity,
                });
            }
            let new_pieces = match batch.remaining_pieces {
                Some(_) => Some(quantity_to_pieces(new_quantity, coefficient)?),
                None => None,
            };
            Ok(BatchRemainder {
                remaining_quantity: new_quantity,
                remaining_pieces: new_pieces,
            })
        }
    }
}

fn clamp_zero(value: Decimal, eps: Decimal) -> Decimal {
    if value.abs() <= eps {
        Decimal::ZERO
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn hose_batch() -> Batch {
        // Roll of 25 meters, 4 rolls = 100 m received
        Batch {
            id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            original_quantity: dec("100"),
            original_pieces: Some(dec("4")),
            remaining_quantity: dec("100"),
            remaining_pieces: Some(dec("4")),
            unit_price: dec("3.20"),
            received_at: Utc::now(),
            source_reference: "PO-2024-0012".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn piece_draw_depletes_both_dimensions() {
        let batch = hose_batch();
        let remainder =
            apply_depletion(&batch, &BatchDraw::from_pieces(dec("1")), dec("25")).unwrap();
        assert_eq!(remainder.remaining_quantity, dec("75"));
        assert_eq!(remainder.remaining_pieces, Some(dec("3")));
    }

    #[test]
    fn quantity_draw_recomputes_pieces() {
        let batch = hose_batch();
        let remainder =
            apply_depletion(&batch, &BatchDraw::from_quantity(dec("50")), dec("25")).unwrap();
        assert_eq!(remainder.remaining_quantity, dec("50"));
        assert_eq!(remainder.remaining_pieces, Some(dec("2")));
    }

    #[test]
    fn overdraw_is_rejected_without_state_change() {
        let mut batch = hose_batch();
        batch.remaining_quantity = dec("30");
        batch.remaining_pieces = Some(dec("1.2"));
        let err =
            apply_depletion(&batch, &BatchDraw::from_quantity(dec("50")), dec("25")).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBatchQuantity {
                requested: dec("50"),
                remaining: dec("30"),
            }
        );
    }

    #[test]
    fn piece_overdraw_is_rejected() {
        let mut batch = hose_batch();
        batch.remaining_pieces = Some(dec("2"));
        batch.remaining_quantity = dec("50");
        let err =
            apply_depletion(&batch, &BatchDraw::from_pieces(dec("3")), dec("25")).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBatchQuantity { .. }));
    }

    #[test]
    fn draining_exactly_to_zero_is_allowed() {
        let batch = hose_batch();
        let remainder =
            apply_depletion(&batch, &BatchDraw::from_quantity(dec("100")), dec("25")).unwrap();
        assert_eq!(remainder.remaining_quantity, Decimal::ZERO);
        assert_eq!(remainder.remaining_pieces, Some(Decimal::ZERO));
    }

    #[test]
    fn near_zero_remainder_counts_as_exhausted() {
        let mut batch = hose_batch();
        batch.remaining_quantity = dec("0.0004");
        assert!(batch.is_exhausted());
        batch.remaining_quantity = dec("0.002");
        assert!(!batch.is_exhausted());
    }

    #[test]
    fn diverged_remainders_resync_on_quantity_draw() {
        // Pieces say 2 rolls but 55 m are left (partial roll sold by length)
        let mut batch = hose_batch();
        batch.remaining_quantity = dec("55");
        batch.remaining_pieces = Some(dec("2"));
        let remainder =
            apply_depletion(&batch, &BatchDraw::from_quantity(dec("5")), dec("25")).unwrap();
        assert_eq!(remainder.remaining_quantity, dec("50"));
        assert_eq!(remainder.remaining_pieces, Some(dec("2")));
    }

    #[test]
    fn restock_returns_material_to_the_lot() {
        let mut batch = hose_batch();
        batch.remaining_quantity = dec("50");
        batch.remaining_pieces = Some(dec("2"));
        let remainder =
            apply_restock(&batch, &BatchDraw::from_pieces(dec("1")), dec("25")).unwrap();
        assert_eq!(remainder.remaining_quantity, dec("75"));
        assert_eq!(remainder.remaining_pieces, Some(dec("3")));
    }

    #[test]
    fn restock_beyond_original_is_rejected() {
        let mut batch = hose_batch();
        batch.remaining_quantity = dec("90");
        batch.remaining_pieces = Some(dec("3.6"));
        let err =
            apply_restock(&batch, &BatchDraw::from_quantity(dec("20")), dec("25")).unwrap_err();
        assert_eq!(
            err,
            LedgerError::ExceedsOriginal {
                requested: dec("110"),
                capacity: dec("100"),
            }
        );
    }

    /// The tolerance must not grow with the coefficient: at coefficient
    /// 1000, 0.001 pieces is a full base unit, well past the allowance.
    #[test]
    fn piece_overdraw_tolerance_does_not_scale_with_coefficient() {
        let mut batch = hose_batch();
        batch.original_quantity = dec("3000");
        batch.original_pieces = Some(dec("3"));
        batch.remaining_quantity = dec("3000");
        batch.remaining_pieces = Some(dec("3"));
        let err = apply_depletion(&batch, &BatchDraw::from_pieces(dec("3.001")), dec("1000"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBatchQuantity { .. }));
        // Draining the exact piece count still works
        let r = apply_depletion(&batch, &BatchDraw::from_pieces(dec("3")), dec("1000")).unwrap();
        assert_eq!(r.remaining_quantity, Decimal::ZERO);
        assert_eq!(r.remaining_pieces, Some(Decimal::ZERO));
    }

    #[test]
    fn piece_restock_tolerance_does_not_scale_with_coefficient() {
        let mut batch = hose_batch();
        batch.original_quantity = dec("3000");
        batch.original_pieces = Some(dec("3"));
        batch.remaining_quantity = dec("2000");
        batch.remaining_pieces = Some(dec("2"));
        let err = apply_restock(&batch, &BatchDraw::from_pieces(dec("1.001")), dec("1000"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::ExceedsOriginal { .. }));
        let r = apply_restock(&batch, &BatchDraw::from_pieces(dec("1")), dec("1000")).unwrap();
        assert_eq!(r.remaining_quantity, dec("3000"));
    }

    #[test]
    fn draw_requires_a_dimension() {
        let batch = hose_batch();
        let err = apply_depletion(&batch, &BatchDraw::default(), dec("25")).unwrap_err();
        assert_eq!(err, LedgerError::MissingDimension);
    }

    #[test]
    fn zero_draw_is_invalid() {
        let batch = hose_batch();
        let err = apply_depletion(&batch, &BatchDraw::from_quantity(Decimal::ZERO), dec("25"))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidQuantity);
    }
}
