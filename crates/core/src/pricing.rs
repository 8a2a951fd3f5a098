//! Checkout arithmetic.
//!
//! All amounts are in the shop currency with two decimal places; rounding is
//! midpoint-away-from-zero, applied once per computed amount.

use rust_decimal::{Decimal, RoundingStrategy};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round a money amount to cents.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price of `quantity` units.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// The parts of a discount code that affect how much it takes off an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountTerms {
    /// Percent off the order subtotal, in `(0, 100]`.
    pub percent: Decimal,
    /// Upper bound on the discount as a percent of the subtotal; `0` means no cap.
    pub max_discount_percent: i32,
}

/// Amount taken off an order with `subtotal`, given the code's terms and the
/// budget still available on the code.
///
/// The result never exceeds the subtotal, the max-percent cap, or the
/// remaining budget, and is never negative.
#[must_use]
pub fn discount_amount(subtotal: Decimal, terms: DiscountTerms, remaining_budget: Decimal) -> Decimal {
    if subtotal <= Decimal::ZERO || terms.percent <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut amount = round_money(subtotal * terms.percent / HUNDRED);

    if terms.max_discount_percent > 0 {
        let cap = round_money(subtotal * Decimal::from(terms.max_discount_percent) / HUNDRED);
        amount = amount.min(cap);
    }

    amount
        .min(remaining_budget.max(Decimal::ZERO))
        .min(subtotal)
        .max(Decimal::ZERO)
}

/// Percentage change from `previous` to `current`, rounded to two places.
///
/// Growth from zero to something is reported as 100%, and zero to zero as 0%.
#[must_use]
pub fn growth_percent(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        round_money((current - previous) / previous * HUNDRED)
    } else if current > Decimal::ZERO {
        HUNDRED
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    fn terms(percent: &str, max: i32) -> DiscountTerms {
        DiscountTerms {
            percent: dec(percent),
            max_discount_percent: max,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("19.99"), 3), dec("59.97"));
        assert_eq!(line_total(dec("0.333"), 3), dec("1.00"));
    }

    #[test]
    fn test_plain_percent() {
        assert_eq!(
            discount_amount(dec("200.00"), terms("10", 0), dec("1000")),
            dec("20.00")
        );
    }

    #[test]
    fn test_max_percent_caps_discount() {
        assert_eq!(
            discount_amount(dec("200.00"), terms("50", 20), dec("1000")),
            dec("40.00")
        );
    }

    #[test]
    fn test_remaining_budget_caps_discount() {
        assert_eq!(
            discount_amount(dec("200.00"), terms("10", 0), dec("5.50")),
            dec("5.50")
        );
        assert_eq!(
            discount_amount(dec("200.00"), terms("10", 0), dec("-3")),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_full_discount_never_exceeds_subtotal() {
        assert_eq!(
            discount_amount(dec("80.00"), terms("100", 0), dec("500")),
            dec("80.00")
        );
    }

    #[test]
    fn test_zero_subtotal() {
        assert_eq!(
            discount_amount(Decimal::ZERO, terms("10", 0), dec("100")),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_growth_percent() {
        assert_eq!(growth_percent(dec("150"), dec("100")), dec("50.00"));
        assert_eq!(growth_percent(dec("50"), dec("100")), dec("-50.00"));
        assert_eq!(growth_percent(dec("10"), Decimal::ZERO), dec("100"));
        assert_eq!(growth_percent(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }
}
