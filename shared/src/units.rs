//! Unit conversion between packaging pieces and base stock units
//!
//! Every item carries a coefficient expressing how many base units one
//! packaging piece holds (e.g. a roll of fire hose = 25 meters). Quantities
//! stay exact `Decimal` values; display rounding is a frontend concern.

use rust_decimal::Decimal;

use crate::error::LedgerError;

/// Convert a piece count to its base-unit quantity.
pub fn pieces_to_quantity(pieces: Decimal, coefficient: Decimal) -> Result<Decimal, LedgerError> {
    if coefficient <= Decimal::ZERO {
        return Err(LedgerError::InvalidCoefficient);
    }
    Ok(pieces * coefficient)
}

/// Convert a base-unit quantity to its piece count.
pub fn quantity_to_pieces(quantity: Decimal, coefficient: Decimal) -> Result<Decimal, LedgerError> {
    if coefficient <= Decimal::ZERO {
        return Err(LedgerError::InvalidCoefficient);
    }
    Ok(quantity / coefficient)
}

/// Whether an item uses a packaging conversion at all.
///
/// A coefficient of 1 means pieces and base units are the same thing.
pub fn has_packaging(coefficient: Decimal) -> bool {
    coefficient != Decimal::ONE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn converts_pieces_to_base_units() {
        let qty = pieces_to_quantity(dec("4"), dec("25")).unwrap();
        assert_eq!(qty, dec("100"));
    }

    #[test]
    fn converts_base_units_to_pieces() {
        let pieces = quantity_to_pieces(dec("100"), dec("25")).unwrap();
        assert_eq!(pieces, dec("4"));
    }

    #[test]
    fn coefficient_one_is_identity() {
        assert!(!has_packaging(Decimal::ONE));
        assert_eq!(
            pieces_to_quantity(dec("7.5"), Decimal::ONE).unwrap(),
            dec("7.5")
        );
    }

    #[test]
    fn rejects_zero_coefficient() {
        assert_eq!(
            pieces_to_quantity(dec("1"), Decimal::ZERO),
            Err(LedgerError::InvalidCoefficient)
        );
        assert_eq!(
            quantity_to_pieces(dec("1"), dec("-2")),
            Err(LedgerError::InvalidCoefficient)
        );
    }

    #[test]
    fn fractional_coefficients_round_trip() {
        let coefficient = dec("2.5");
        let pieces = dec("3");
        let qty = pieces_to_quantity(pieces, coefficient).unwrap();
        assert_eq!(quantity_to_pieces(qty, coefficient).unwrap(), pieces);
    }
}
