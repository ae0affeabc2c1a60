//! Per-currency discount rates.
//!
//! Fiat, SOL and USDT payments get a flat discount. COST payments get the
//! tier's headline discount during an introductory window that starts at the
//! first deposit, decaying to a floor rate once the window has elapsed.

use crate::amount::Amount;
use crate::currency::Currency;
use crate::error::{Result, WalletError};
use crate::tier::TierStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shape of the COST decay over the introductory window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecayCurve {
    /// Straight line from the introductory rate down to the floor.
    Linear,
    /// Equal drops at `steps` evenly spaced points across the window.
    Step {
        /// Number of drops; the last lands on the floor at the end of the window.
        steps: u32,
    },
}

/// Discount policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountPolicy {
    /// Flat discount for fiat, SOL and USDT.
    pub flat_rate: Decimal,
    /// Steady-state COST discount after the window.
    pub floor_rate: Decimal,
    /// Length of the introductory window in days.
    pub window_days: u32,
    /// Decay curve across the window.
    pub curve: DecayCurve,
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            flat_rate: Decimal::new(5, 0),
            floor_rate: Decimal::new(15, 0),
            window_days: 365,
            curve: DecayCurve::Linear,
        }
    }
}

impl DiscountPolicy {
    /// Check the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for rates outside `[0, 100]`, a zero
    /// window, or a step curve with zero steps.
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [("flat_rate", self.flat_rate), ("floor_rate", self.floor_rate)] {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(WalletError::config(format!(
                    "discount.{name} must be within 0..=100, got {rate}"
                )));
            }
        }
        if self.window_days == 0 {
            return Err(WalletError::config("discount.window_days must be greater than 0"));
        }
        if let DecayCurve::Step { steps: 0 } = self.curve {
            return Err(WalletError::config("discount.curve.steps must be greater than 0"));
        }
        Ok(())
    }

    /// COST discount for a tier headline rate at a given account age.
    ///
    /// The introductory rate is `max(headline, floor)`, so the result never
    /// rises with age and equals the floor once `age_days >= window_days`.
    #[must_use]
    pub fn cost_rate(&self, headline: Decimal, age_days: u32) -> Decimal {
        let floor = clamp_percent(self.floor_rate);
        let intro = clamp_percent(headline).max(floor);
        if age_days >= self.window_days {
            return floor;
        }

        let window = Decimal::from(self.window_days);
        let elapsed = match self.curve {
            DecayCurve::Linear => Decimal::from(age_days) / window,
            DecayCurve::Step { steps } => {
                let steps = u64::from(steps.max(1));
                let taken = u64::from(age_days) * steps / u64::from(self.window_days);
                Decimal::from(taken) / Decimal::from(steps)
            }
        };
        clamp_percent(intro - (intro - floor) * elapsed).round_dp(2)
    }

    /// Discount percentage for paying in `currency`.
    #[must_use]
    pub fn rate_for(&self, currency: Currency, tier: &TierStatus, age_days: u32) -> Decimal {
        match currency {
            Currency::Fiat | Currency::Sol | Currency::Usdt => clamp_percent(self.flat_rate),
            Currency::Cost => self.cost_rate(tier.discount, age_days),
        }
    }

    /// Full discount view for a wallet.
    #[must_use]
    pub fn info(&self, membership: TierStatus, age_days: u32) -> DiscountInfo {
        let discounts = CurrencyDiscounts {
            fiat: self.rate_for(Currency::Fiat, &membership, age_days),
            sol: self.rate_for(Currency::Sol, &membership, age_days),
            usdt: self.rate_for(Currency::Usdt, &membership, age_days),
            cost: self.rate_for(Currency::Cost, &membership, age_days),
        };
        let message = format!(
            "{} member: {}% off when you pay with COST, {}% off with other currencies",
            membership.tier_name, discounts.cost, discounts.fiat
        );
        DiscountInfo {
            membership,
            discounts,
            account_age_days: age_days,
            message,
        }
    }
}

/// Discount percentage per currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDiscounts {
    /// Fiat discount.
    pub fiat: Decimal,
    /// SOL discount.
    pub sol: Decimal,
    /// USDT discount.
    pub usdt: Decimal,
    /// COST discount.
    pub cost: Decimal,
}

impl CurrencyDiscounts {
    /// Discount for one currency.
    #[must_use]
    pub const fn get(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Fiat => self.fiat,
            Currency::Sol => self.sol,
            Currency::Usdt => self.usdt,
            Currency::Cost => self.cost,
        }
    }
}

/// Active tier plus per-currency discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountInfo {
    /// Membership the discounts were derived from.
    pub membership: TierStatus,
    /// Per-currency rates.
    pub discounts: CurrencyDiscounts,
    /// Days since first deposit used for the COST rate.
    #[serde(default)]
    pub account_age_days: u32,
    /// Banner text.
    pub message: String,
}

/// A price after discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountedPrice {
    /// Price before discount.
    pub original: Amount,
    /// Discount percentage applied.
    pub rate: Decimal,
    /// Amount taken off (never more than `original`).
    pub discount: Amount,
    /// Price to pay, rounded to currency precision.
    pub total: Amount,
}

/// Clamp a percentage into `[0, 100]`.
#[must_use]
pub fn clamp_percent(rate: Decimal) -> Decimal {
    rate.max(Decimal::ZERO).min(Decimal::ONE_HUNDRED)
}

/// Apply a discount percentage to a price: `price * (1 - rate / 100)`,
/// rounded to the precision of `currency`.
///
/// # Errors
///
/// Returns `InvalidAmount` if the computation overflows.
pub fn apply_discount(price: Amount, rate: Decimal, currency: Currency) -> Result<DiscountedPrice> {
    let rate = clamp_percent(rate);
    let factor = Decimal::ONE - rate / Decimal::ONE_HUNDRED;
    let total = price
        .checked_mul(factor)
        .ok_or_else(|| WalletError::invalid_amount("price out of range"))?
        .round_for(currency);
    let total = total.min(price);
    Ok(DiscountedPrice {
        original: price,
        rate,
        discount: price.saturating_sub(total),
        total,
    })
}

/// Whole days between the first deposit and `now`; zero if there was none.
#[must_use]
pub fn account_age_days(first_deposit_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    first_deposit_at
        .map(|first| (now - first).num_days().clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}
