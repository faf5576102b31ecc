// [libs/domain/models/src/money.rs]
//! Integer minor-unit money. No float ever touches a persisted amount;
//! floats exist only as transient proration/aggregation intermediates,
//! rounded exactly once at row emission.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount_cents: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self { amount_cents, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self { amount_cents: 0, currency }
    }
}

/// ISO-4217 alpha code. Stored and compared as the raw code; this workspace
/// does not need a currency registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(pub [u8; 3]);

impl Currency {
    pub fn code(s: &str) -> Self {
        let bytes = s.as_bytes();
        let mut code = [0u8; 3];
        let len = bytes.len().min(3);
        code[..len].copy_from_slice(&bytes[..len]);
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("???").trim_end_matches('\0')
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `floor(x + 0.5)`, i.e. round-half-up. Applied exactly once per rating row,
/// after clamping, never composed with itself.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Clamp a raw amount into `[minimum, maximum]` when either bound is present.
/// Only metered rows are clamped; flat rows never are.
pub fn clamp_amount(amount_cents: i64, minimum_cents: Option<i64>, maximum_cents: Option<i64>) -> i64 {
    let mut value = amount_cents;
    if let Some(min) = minimum_cents {
        value = value.max(min);
    }
    if let Some(max) = maximum_cents {
        value = value.min(max);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_up_rounds_point_five_away_from_zero_upward() {
        assert_eq!(round_half_up(4838.5), 4839);
        assert_eq!(round_half_up(4838.49), 4838);
        assert_eq!(round_half_up(0.0), 0);
    }

    #[test]
    fn clamp_applies_both_bounds() {
        assert_eq!(clamp_amount(50, Some(100), None), 100);
        assert_eq!(clamp_amount(500, None, Some(300)), 300);
        assert_eq!(clamp_amount(150, Some(100), Some(300)), 150);
    }

    #[test]
    fn currency_round_trips_through_str() {
        let usd = Currency::code("USD");
        assert_eq!(usd.as_str(), "USD");
    }
}
