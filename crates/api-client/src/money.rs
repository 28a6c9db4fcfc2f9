// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Decimal rounding rules and timing helpers shared by providers

use std::time::Instant;

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for converted amounts
pub const AMOUNT_SCALE: u32 = 2;

/// Decimal places kept for back-computed rates
pub const RATE_SCALE: u32 = 4;

/// Round half-up to exactly `scale` decimal places
pub fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// `amount * rate`, rounded to [`AMOUNT_SCALE`] places
pub fn converted_amount(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .map(|total| round_half_up(total, AMOUNT_SCALE))
}

/// `total / amount`, rounded to [`RATE_SCALE`] places
pub fn implied_rate(total: Decimal, amount: Decimal) -> Option<Decimal> {
    total
        .checked_div(amount)
        .map(|rate| round_half_up(rate, RATE_SCALE))
}

/// Milliseconds elapsed since `started`, saturating
pub fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn converted_amount_rounds_half_up() {
        assert_eq!(converted_amount(dec!(100.00), dec!(0.85)), Some(dec!(85.00)));
        assert_eq!(converted_amount(dec!(50.00), dec!(17.50)), Some(dec!(875.00)));
        assert_eq!(converted_amount(dec!(25.00), dec!(68.50)), Some(dec!(1712.50)));
        assert_eq!(converted_amount(dec!(1.005), dec!(1)), Some(dec!(1.01)));
        assert_eq!(converted_amount(dec!(10), dec!(0.12345)), Some(dec!(1.23)));
    }

    #[test]
    fn implied_rate_keeps_four_places() {
        let rate = implied_rate(dec!(84.00), dec!(100.00)).unwrap();
        assert_eq!(rate, dec!(0.84));
        assert_eq!(rate.to_string(), "0.8400");

        assert_eq!(implied_rate(dec!(2), dec!(3)), Some(dec!(0.6667)));
        assert_eq!(implied_rate(dec!(1), dec!(0)), None);
    }

    #[test]
    fn round_half_up_pads_scale() {
        assert_eq!(round_half_up(dec!(85), 2).to_string(), "85.00");
        assert_eq!(round_half_up(dec!(0.00005), 4).to_string(), "0.0001");
    }
}
