//! Monetary amount representation.
//!
//! Amounts are non-negative decimals. The type cannot hold a negative value,
//! so a balance built from `Amount`s can never go below zero.

use crate::currency::Currency;
use crate::error::{Result, WalletError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative amount of some currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal.
    ///
    /// # Errors
    ///
    /// Returns error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(WalletError::invalid_amount(format!(
                "amount must be non-negative, got {value}"
            )));
        }
        Ok(Self(value.normalize()))
    }

    /// Create an amount from whole units.
    #[must_use]
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Create an amount from a mantissa and scale, e.g. `(12345, 2)` is `123.45`.
    ///
    /// # Errors
    ///
    /// Returns error if the scale is out of range.
    pub fn from_parts(mantissa: u64, scale: u32) -> Result<Self> {
        Decimal::try_from_i128_with_scale(i128::from(mantissa), scale)
            .map(Self)
            .map_err(|e| WalletError::invalid_amount(e.to_string()))
    }

    /// Parse user input into a strictly positive amount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the input is not numeric, or is zero or negative.
    pub fn parse_positive(input: &str) -> Result<Self> {
        let amount: Self = input.parse()?;
        if amount.is_zero() {
            return Err(WalletError::invalid_amount("amount must be positive"));
        }
        Ok(amount)
    }

    /// Get the decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round half away from zero to the precision of `currency`.
    #[must_use]
    pub fn round_for(&self, currency: Currency) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(currency.precision(), RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        )
    }

    /// Truncate toward zero at the precision of `currency`.
    #[must_use]
    pub fn truncate_for(&self, currency: Currency) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(currency.precision(), RoundingStrategy::ToZero)
                .normalize(),
        )
    }

    /// Saturating subtraction (floors at zero).
    #[must_use]
    pub fn saturating_sub(&self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction; `None` if the result would be negative.
    #[must_use]
    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        if other.0 > self.0 {
            None
        } else {
            self.0.checked_sub(other.0).map(Self)
        }
    }

    /// Checked multiplication by a non-negative factor.
    #[must_use]
    pub fn checked_mul(&self, factor: Decimal) -> Option<Self> {
        if factor.is_sign_negative() && !factor.is_zero() {
            return None;
        }
        self.0.checked_mul(factor).map(Self)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = Decimal::from_str(trimmed)
            .map_err(|_| WalletError::invalid_amount(format!("'{trimmed}' is not a number")))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self::from_units(units)
    }
}
