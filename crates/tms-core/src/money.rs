//! # Monetary Amounts
//!
//! [`Money`] stores amounts as integer minor units (cents). Floats are
//! unrepresentable by construction — a serialized amount is always an
//! exact integer, so persisted offers and invoices never accumulate
//! rounding drift.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A monetary amount in integer minor units (cents).
///
/// Offer amounts must be positive; zero and negative amounts are rejected
/// by [`Money::from_cents`]. Serializes as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create an amount from minor units, rejecting non-positive values.
    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents <= 0 {
            return Err(ValidationError::InvalidAmount(format!(
                "amount must be positive, got {cents} cents"
            )));
        }
        Ok(Self(cents))
    }

    /// The amount in minor units.
    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / 100;
        let frac = (self.0 % 100).abs();
        write!(f, "{whole}.{frac:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_accepts_positive() {
        let m = Money::from_cents(250_000).unwrap();
        assert_eq!(m.cents(), 250_000);
    }

    #[test]
    fn test_from_cents_rejects_zero_and_negative() {
        assert!(Money::from_cents(0).is_err());
        assert!(Money::from_cents(-1).is_err());
    }

    #[test]
    fn test_display_formats_minor_units() {
        assert_eq!(Money::from_cents(250_000).unwrap().to_string(), "2500.00");
        assert_eq!(Money::from_cents(105).unwrap().to_string(), "1.05");
    }

    #[test]
    fn test_serde_is_bare_integer() {
        let m = Money::from_cents(240_000).unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "240000");
        let parsed: Money = serde_json::from_str("240000").unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn test_ordering() {
        let lo = Money::from_cents(240_000).unwrap();
        let hi = Money::from_cents(250_000).unwrap();
        assert!(lo < hi);
    }
}
