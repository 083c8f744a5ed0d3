//! USDC amounts as fixed-point integers.
//!
//! USDC has six decimals, so balances and prices are held as whole
//! micro-USDC in an `i64`. On the wire an amount is a plain decimal JSON
//! number (`1.5`), matching what agents send and expect back.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Micro-units per whole USDC.
pub const MICROS_PER_USDC: i64 = 1_000_000;

/// An amount of USDC, stored in micro-units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Usdc(i64);

impl Usdc {
    pub const ZERO: Usdc = Usdc(0);

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents * (MICROS_PER_USDC / 100))
    }

    /// Convert a decimal amount, rounding to the nearest micro-unit.
    ///
    /// Returns `None` for NaN or infinite input.
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        Some(Self((amount * MICROS_PER_USDC as f64).round() as i64))
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / MICROS_PER_USDC as f64
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_sub(self, rhs: Usdc) -> Option<Usdc> {
        self.0.checked_sub(rhs.0).map(Usdc)
    }
}

impl Add for Usdc {
    type Output = Usdc;

    fn add(self, rhs: Usdc) -> Usdc {
        Usdc(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Usdc {
    type Output = Usdc;

    fn sub(self, rhs: Usdc) -> Usdc {
        Usdc(self.0.saturating_sub(rhs.0))
    }
}

impl std::iter::Sum for Usdc {
    fn sum<I: Iterator<Item = Usdc>>(iter: I) -> Usdc {
        iter.fold(Usdc::ZERO, |acc, x| acc + x)
    }
}

/// Formats with two decimals, widening to six when sub-cent digits exist.
impl fmt::Display for Usdc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / MICROS_PER_USDC as u64;
        let frac = abs % MICROS_PER_USDC as u64;
        if frac % 10_000 == 0 {
            write!(f, "{sign}{whole}.{:02}", frac / 10_000)
        } else {
            let digits = format!("{frac:06}");
            write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

impl Serialize for Usdc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Usdc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Usdc::from_decimal(amount)
            .ok_or_else(|| serde::de::Error::custom("amount must be a finite number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_and_decimal_agree() {
        assert_eq!(Usdc::from_cents(150), Usdc::from_decimal(1.5).unwrap());
        assert_eq!(Usdc::from_cents(100).micros(), 1_000_000);
    }

    #[test]
    fn decimal_rounds_to_nearest_micro() {
        assert_eq!(Usdc::from_decimal(0.1 + 0.2).unwrap().micros(), 300_000);
    }

    #[test]
    fn non_finite_decimal_is_rejected() {
        assert!(Usdc::from_decimal(f64::NAN).is_none());
        assert!(Usdc::from_decimal(f64::INFINITY).is_none());
    }

    #[test]
    fn display_uses_cents_unless_finer() {
        assert_eq!(Usdc::from_cents(75).to_string(), "0.75");
        assert_eq!(Usdc::from_cents(500).to_string(), "5.00");
        assert_eq!(Usdc::from_micros(1_234_500).to_string(), "1.2345");
        assert_eq!(Usdc::from_cents(-50).to_string(), "-0.50");
    }

    #[test]
    fn serializes_as_decimal_number() {
        let json = serde_json::to_value(Usdc::from_cents(150)).unwrap();
        assert_eq!(json, serde_json::json!(1.5));
        let back: Usdc = serde_json::from_value(json).unwrap();
        assert_eq!(back, Usdc::from_cents(150));
    }

    #[test]
    fn subtraction_saturates() {
        let a = Usdc::from_micros(i64::MIN);
        assert_eq!(a - Usdc::from_cents(1), Usdc::from_micros(i64::MIN));
        assert!(Usdc::from_cents(1).checked_sub(Usdc::from_cents(2)).unwrap().is_negative());
    }
}
