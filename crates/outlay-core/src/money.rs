//! Exact decimal money helpers
//!
//! Amounts are `rust_decimal::Decimal` everywhere in the API and integer
//! cents in SQLite, so SQL `SUM`/`GROUP BY` stay exact. All rounding is
//! half-up (midpoint away from zero) at an explicit number of digits.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round to exactly `dp` fraction digits, half-up. The result always
/// carries `dp` digits, so totals and percentages format consistently.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

/// Convert a decimal amount to integer cents, quantizing to 2 fraction
/// digits half-up first. The sign is preserved; negative amounts are not
/// rejected here. Returns `None` only when the value does not fit in an
/// i64 cent count.
pub fn try_to_cents(amount: Decimal) -> Option<i64> {
    let scaled = round_half_up(amount, 2).checked_mul(Decimal::ONE_HUNDRED)?;
    // After rounding to 2 digits and scaling by 100 the value is integral.
    scaled.to_i64()
}

/// Convert integer cents back to a 2-digit decimal.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// `part / whole * 100`, at 2 fraction digits. Division is carried at
/// 4 fraction digits half-up before scaling, then rescaled to 2 half-up,
/// matching the output contract of the dashboard percentages. Returns
/// zero when `whole` is not positive.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let ratio = round_half_up(part / whole, 4);
    round_half_up(ratio * Decimal::from(100), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rounds_midpoints_away_from_zero() {
        assert_eq!(round_half_up(dec("10.005"), 2).to_string(), "10.01");
        assert_eq!(round_half_up(dec("-10.005"), 2).to_string(), "-10.01");
    }

    #[test]
    fn cents_round_trip() {
        assert_eq!(try_to_cents(dec("1234.56")), Some(123456));
        assert_eq!(from_cents(123456), dec("1234.56"));
    }

    #[test]
    fn cents_quantize_extra_digits() {
        assert_eq!(try_to_cents(dec("10.999")), Some(1100));
    }

    #[test]
    fn cents_reject_values_that_do_not_fit() {
        assert_eq!(try_to_cents(dec("1000000000000000000000000000")), None);
        assert_eq!(try_to_cents(Decimal::MAX), None);
        assert_eq!(try_to_cents(Decimal::MIN), None);
    }

    #[test]
    fn percent_of_zero_whole_is_zero() {
        assert_eq!(percent_of(dec("50"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn percent_of_thirds() {
        // 1/3 carried at 4 digits: 0.3333 -> 33.33
        assert_eq!(percent_of(dec("1"), dec("3")).to_string(), "33.33");
    }
}
