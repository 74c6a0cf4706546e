//! Validation helpers for ledger inputs

use rust_decimal::Decimal;

use crate::error::LedgerError;

/// Line quantities must be strictly positive; direction is carried by the
/// movement kind, never by sign.
pub fn validate_line_quantity(quantity: Decimal) -> Result<(), LedgerError> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::InvalidQuantity);
    }
    Ok(())
}

/// Item coefficients must be strictly positive.
pub fn validate_coefficient(coefficient: Decimal) -> Result<(), LedgerError> {
    if coefficient <= Decimal::ZERO {
        return Err(LedgerError::InvalidCoefficient);
    }
    Ok(())
}

/// Fictitious prices may be zero (explicitly free material) but never negative.
pub fn validate_override_price(price: Decimal) -> Result<(), LedgerError> {
    if price < Decimal::ZERO {
        return Err(LedgerError::InvalidPrice);
    }
    Ok(())
}

/// Validate an item code: non-empty, uppercase alphanumeric plus dashes.
pub fn validate_item_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("Item code cannot be empty");
    }
    if code.len() > 32 {
        return Err("Item code must be at most 32 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Item code must be uppercase alphanumeric with dashes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert_eq!(
            validate_line_quantity(Decimal::ZERO),
            Err(LedgerError::InvalidQuantity)
        );
        assert_eq!(
            validate_line_quantity(dec("-3")),
            Err(LedgerError::InvalidQuantity)
        );
        assert!(validate_line_quantity(dec("0.001")).is_ok());
    }

    #[test]
    fn negative_price_is_rejected_zero_allowed() {
        assert_eq!(
            validate_override_price(dec("-0.01")),
            Err(LedgerError::InvalidPrice)
        );
        assert!(validate_override_price(Decimal::ZERO).is_ok());
    }

    #[test]
    fn item_codes_are_uppercase_alphanumeric() {
        assert!(validate_item_code("EST-6KG-ABC").is_ok());
        assert!(validate_item_code("").is_err());
        assert!(validate_item_code("lowercase").is_err());
    }
}
