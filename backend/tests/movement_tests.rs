//! Movement recording tests
//!
//! Tests for the recording rules that do not need a database:
//! - Quantity validation (direction comes from the kind, not the sign)
//! - Price resolution (override beats batch cost; missing price flags,
//!   never fails)
//! - Stock effect of each movement kind, fictitious lines excluded

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    resolve_unit_price, stock_effect, validate_line_quantity, LedgerError, LineInput,
    MovementKind, MovementLine,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Zero and negative quantities are rejected for every movement kind
    #[test]
    fn test_zero_quantity_rejected() {
        assert_eq!(
            validate_line_quantity(Decimal::ZERO),
            Err(LedgerError::InvalidQuantity)
        );
        assert_eq!(
            validate_line_quantity(dec("-5")),
            Err(LedgerError::InvalidQuantity)
        );
        assert!(validate_line_quantity(dec("0.5")).is_ok());
    }

    /// Scenario: job override 12.50 wins over batch cost 9.00
    #[test]
    fn test_override_beats_batch_cost() {
        let (price, missing) = resolve_unit_price(Some(dec("12.50")), Some(dec("9.00")));
        assert_eq!(price, dec("12.50"));
        assert!(!missing);
    }

    /// Scenario: fictitious line with no override resolves to 0 and is
    /// flagged for review; the movement still records.
    #[test]
    fn test_fictitious_line_without_override() {
        let (price, missing) = resolve_unit_price(None, None);
        assert_eq!(price, Decimal::ZERO);
        assert!(missing);
    }

    /// Batch cost applies when the job has no negotiated rate
    #[test]
    fn test_batch_cost_without_override() {
        let (price, missing) = resolve_unit_price(None, Some(dec("9.00")));
        assert_eq!(price, dec("9.00"));
        assert!(!missing);
    }

    /// Fictitious lines never touch physical stock
    #[test]
    fn test_fictitious_lines_have_no_stock_effect() {
        for kind in [MovementKind::Entry, MovementKind::Exit, MovementKind::Sale] {
            assert_eq!(stock_effect(kind, true, dec("42")), Decimal::ZERO);
        }
    }

    /// Entries add, exits and sales subtract
    #[test]
    fn test_stock_effect_signs() {
        assert_eq!(
            stock_effect(MovementKind::Entry, false, dec("10")),
            dec("10")
        );
        assert_eq!(
            stock_effect(MovementKind::Exit, false, dec("10")),
            dec("-10")
        );
        assert_eq!(
            stock_effect(MovementKind::Sale, false, dec("10")),
            dec("-10")
        );
    }

    /// The two recording paths are distinct input variants
    #[test]
    fn test_line_input_variants() {
        let item_id = Uuid::new_v4();
        let real = LineInput::Real {
            item_id,
            batch_id: Some(Uuid::new_v4()),
            quantity: Some(dec("10")),
            pieces: None,
            unit_price: None,
        };
        let fictitious = LineInput::Fictitious {
            item_id,
            quantity: dec("10"),
        };
        assert!(!real.is_fictitious());
        assert!(fictitious.is_fictitious());
        assert_eq!(real.item_id(), item_id);
        assert_eq!(fictitious.item_id(), item_id);
    }

    /// Material cost of a line is quantity times the recorded price
    #[test]
    fn test_line_cost_uses_recorded_price() {
        let quantity = dec("8");
        let (price, _) = resolve_unit_price(Some(dec("12.50")), Some(dec("9.00")));
        assert_eq!(quantity * price, dec("100.00"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use shared::project_on_hand;

    /// Strategy for generating line quantities
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    /// Strategy for generating movement kinds
    fn kind_strategy() -> impl Strategy<Value = MovementKind> {
        prop_oneof![
            Just(MovementKind::Entry),
            Just(MovementKind::Exit),
            Just(MovementKind::Sale),
        ]
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

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// On-hand maintained incrementally equals the full-replay fold
        #[test]
        fn prop_incremental_equals_replay(
            history in prop::collection::vec(
                (kind_strategy(), quantity_strategy(), any::<bool>()),
                0..30
            )
        ) {
            let lines: Vec<(MovementKind, MovementLine)> = history
                .into_iter()
                .map(|(kind, quantity, is_fictitious)| (kind, line(quantity, is_fictitious)))
                .collect();

            // Incremental: apply each committed line's effect as it lands
            let mut incremental = Decimal::ZERO;
            for (kind, l) in &lines {
                incremental += stock_effect(*kind, l.is_fictitious, l.quantity);
            }

            // Replay: pure fold over the whole history
            let replayed = project_on_hand(lines.iter().map(|(kind, l)| (*kind, l)));

            prop_assert_eq!(incremental, replayed);
        }

        /// Resolved prices are never negative and flag exactly the zeros
        #[test]
        fn prop_resolved_price_is_sane(
            override_price in prop::option::of((0i64..=100000i64).prop_map(|n| Decimal::new(n, 2))),
            batch_price in prop::option::of((0i64..=100000i64).prop_map(|n| Decimal::new(n, 2)))
        ) {
            let (price, missing) = resolve_unit_price(override_price, batch_price);
            prop_assert!(price >= Decimal::ZERO);
            prop_assert_eq!(missing, price == Decimal::ZERO);
        }
    }
}
