//! Money math over decimal prices.
//!
//! Products carry a list `price` and an absolute `discount` override; a
//! discount of zero means "no discount". All order snapshots and cart
//! totals are computed from the effective unit price.

use rust_decimal::Decimal;

/// The price a buyer actually pays for one unit.
///
/// Returns `discount` when it is greater than zero, otherwise `price`.
#[must_use]
pub fn effective_unit_price(price: Decimal, discount: Decimal) -> Decimal {
    if discount > Decimal::ZERO {
        discount
    } else {
        price
    }
}

/// Total for one cart or order line: effective unit price times quantity.
#[must_use]
pub fn line_total(price: Decimal, discount: Decimal, quantity: i32) -> Decimal {
    effective_unit_price(price, discount) * Decimal::from(quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_effective_price_without_discount() {
        assert_eq!(
            effective_unit_price(dec("19.99"), Decimal::ZERO),
            dec("19.99")
        );
    }

    #[test]
    fn test_effective_price_with_discount() {
        assert_eq!(effective_unit_price(dec("19.99"), dec("14.50")), dec("14.50"));
    }

    #[test]
    fn test_discount_higher_than_price_still_wins() {
        // The discount is an absolute override, not a reduction
        assert_eq!(effective_unit_price(dec("10"), dec("12")), dec("12"));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("10.00"), Decimal::ZERO, 3), dec("30.00"));
        assert_eq!(line_total(dec("10.00"), dec("8.00"), 3), dec("24.00"));
    }

    #[test]
    fn test_line_total_zero_quantity() {
        assert_eq!(line_total(dec("10.00"), Decimal::ZERO, 0), Decimal::ZERO);
    }
}
