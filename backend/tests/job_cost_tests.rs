//! Job material cost tests
//!
//! Tests for cost aggregation rules:
//! - Cost uses the price recorded at movement time, so later override
//!   edits never rewrite history
//! - Missing prices sum as zero instead of failing the total

use rust_decimal::Decimal;
use std::str::FromStr;

use shared::resolve_unit_price;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Scenario: override (J, itemX) = 12.50, batch priced 9.00; the job is
    /// billed 12.50 per unit.
    #[test]
    fn test_material_cost_uses_override() {
        let quantity = dec("8");
        let (price, _) = resolve_unit_price(Some(dec("12.50")), Some(dec("9.00")));
        assert_eq!(quantity * price, dec("100.00"));
    }

    /// Recorded prices are immutable: a later override change affects only
    /// lines recorded after it
    #[test]
    fn test_recorded_prices_are_immutable() {
        // Line recorded while the override was 12.50
        let (old_price, _) = resolve_unit_price(Some(dec("12.50")), Some(dec("9.00")));
        let recorded = dec("4") * old_price;

        // Override later changed to 15.00; the old line keeps its price
        let (new_price, _) = resolve_unit_price(Some(dec("15.00")), Some(dec("9.00")));
        let newer = dec("4") * new_price;

        assert_eq!(recorded, dec("50.00"));
        assert_eq!(newer, dec("60.00"));
        assert_eq!(recorded + newer, dec("110.00"));
    }

    /// Lines with a missing price sum as zero; the total never fails
    #[test]
    fn test_missing_price_sums_as_zero() {
        let lines = [
            (dec("10"), dec("12.50"), false),
            (dec("5"), Decimal::ZERO, true), // missing price, flagged
            (dec("2"), dec("9.00"), false),
        ];

        let total: Decimal = lines.iter().map(|(qty, price, _)| qty * price).sum();
        let missing = lines.iter().filter(|(_, _, flagged)| *flagged).count();

        assert_eq!(total, dec("143.00"));
        assert_eq!(missing, 1);
    }

    /// Only exit/sale lines bill a job; entries do not
    #[test]
    fn test_only_consuming_kinds_bill() {
        use shared::MovementKind;

        let billable = [MovementKind::Exit, MovementKind::Sale];
        let non_billable = [MovementKind::Entry];

        for kind in billable {
            assert!(kind.consumes_stock());
        }
        for kind in non_billable {
            assert!(!kind.consumes_stock());
        }
    }
}
