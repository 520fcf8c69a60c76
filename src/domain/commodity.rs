//! Commodity entity and the bounded random walk applied on every price tick.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Largest absolute price move per tick, in millionths (2%).
pub const MAX_CHANGE_MICROS: i64 = 20_000;

/// Prices are kept at cent precision.
pub const PRICE_SCALE: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commodity {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub current_price: BigDecimal,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCommodity {
    pub name: String,
    pub unit: String,
    pub current_price: BigDecimal,
}

/// The lowest price a commodity can take: 0.01.
pub fn price_floor() -> BigDecimal {
    BigDecimal::new(1.into(), PRICE_SCALE)
}

/// Moves `current` by `change_micros` millionths, rounds half-up to cents and
/// clamps at [`price_floor`].
pub fn walk_price(current: &BigDecimal, change_micros: i64) -> BigDecimal {
    let factor = BigDecimal::new((1_000_000 + change_micros).into(), 6);
    let next = (current * &factor).round(PRICE_SCALE);

    let floor = price_floor();
    if next < floor {
        floor
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_walk_price_without_change() {
        assert_eq!(walk_price(&dec("2000.00"), 0), dec("2000.00"));
    }

    #[test]
    fn test_walk_price_applies_percentage() {
        // +1.5%
        assert_eq!(walk_price(&dec("2000.00"), 15_000), dec("2030.00"));
        // -2%
        assert_eq!(walk_price(&dec("25.50"), -20_000), dec("24.99"));
    }

    #[test]
    fn test_walk_price_rounds_half_up() {
        // 2.00 * 1.002500 = 2.005
        assert_eq!(walk_price(&dec("2.00"), 2_500), dec("2.01"));
        // 2.00 * 1.002499 = 2.004998
        assert_eq!(walk_price(&dec("2.00"), 2_499), dec("2.00"));
    }

    #[test]
    fn test_walk_price_never_goes_below_floor() {
        assert_eq!(walk_price(&dec("0.01"), -20_000), price_floor());
        assert_eq!(walk_price(&dec("0.01"), -1), dec("0.01"));
    }

    #[test]
    fn test_price_floor_is_one_cent() {
        assert_eq!(price_floor(), dec("0.01"));
    }
}
