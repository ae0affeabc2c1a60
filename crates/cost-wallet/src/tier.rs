//! Membership tiers driven by COST holdings.
//!
//! A wallet's tier is the highest tier whose threshold does not exceed its
//! COST balance. Resolution is a pure function of the balance: there is no
//! hysteresis, so the tier moves up and down with the balance.

use crate::amount::Amount;
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Membership tier, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    /// Entry tier.
    Basic,
    /// Bronze tier.
    Bronze,
    /// Silver tier.
    Silver,
    /// Gold tier.
    Gold,
    /// Top tier.
    Platinum,
}

impl MembershipTier {
    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }

    /// Icon name shown next to the tier badge.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Basic => "person",
            Self::Bronze => "star",
            Self::Silver => "ribbon",
            Self::Gold => "medal",
            Self::Platinum => "trophy",
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Bronze => write!(f, "bronze"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
            Self::Platinum => write!(f, "platinum"),
        }
    }
}

/// One row of the tier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    /// The tier.
    pub tier: MembershipTier,
    /// Minimum COST balance to hold this tier.
    pub min_balance: Amount,
    /// Headline COST discount percentage.
    pub discount: Decimal,
    /// Display color.
    pub color: String,
}

impl TierSpec {
    fn new(tier: MembershipTier, min_balance: u64, discount: i64, color: &str) -> Self {
        Self {
            tier,
            min_balance: Amount::from_units(min_balance),
            discount: Decimal::new(discount, 0),
            color: color.to_string(),
        }
    }
}

/// The next tier up and how far away it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextTier {
    /// The next tier.
    pub tier: MembershipTier,
    /// Display name.
    pub tier_name: String,
    /// Headline discount of the next tier.
    pub discount: Decimal,
    /// Display color.
    pub color: String,
    /// Threshold of the next tier.
    pub min_balance: Amount,
    /// COST still needed to reach it (never negative).
    pub tokens_needed: Amount,
}

/// Resolved membership for a COST balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStatus {
    /// Active tier.
    pub tier: MembershipTier,
    /// Display name.
    pub tier_name: String,
    /// Headline COST discount of the active tier.
    pub discount: Decimal,
    /// Display color.
    pub color: String,
    /// Icon name.
    pub icon: String,
    /// Threshold of the active tier.
    pub min_balance: Amount,
    /// COST balance the status was resolved from.
    pub cost_balance: Amount,
    /// Next tier, absent at the top tier.
    pub next_tier: Option<NextTier>,
}

impl TierStatus {
    /// Progress toward the next tier as a percentage in `[0, 100]`.
    #[must_use]
    pub fn progress_percent(&self) -> Decimal {
        let Some(next) = &self.next_tier else {
            return Decimal::ONE_HUNDRED;
        };
        if next.min_balance.is_zero() {
            return Decimal::ONE_HUNDRED;
        }
        let ratio = self
            .cost_balance
            .value()
            .checked_div(next.min_balance.value())
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ONE_HUNDRED);
        ratio.min(Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// Row of the public tier listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierListing {
    /// The tier.
    pub tier: MembershipTier,
    /// Display name.
    pub name: String,
    /// Lower bound (inclusive).
    pub min_balance: Amount,
    /// Upper bound shown to users; `None` for the top tier.
    pub max_balance: Option<Amount>,
    /// Headline discount.
    pub discount: Decimal,
    /// Display color.
    pub color: String,
}

/// Ordered, validated tier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TierSpec>", into = "Vec<TierSpec>")]
pub struct TierTable {
    tiers: Vec<TierSpec>,
}

impl TierTable {
    /// Build a table.
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless the table is non-empty, starts at
    /// a zero threshold, and has strictly increasing thresholds and tiers,
    /// with every discount within `[0, 100]`.
    pub fn new(tiers: Vec<TierSpec>) -> Result<Self> {
        let Some(first) = tiers.first() else {
            return Err(WalletError::config("tier table must not be empty"));
        };
        if !first.min_balance.is_zero() {
            return Err(WalletError::config("lowest tier must start at 0 COST"));
        }
        for pair in tiers.windows(2) {
            if pair[1].min_balance <= pair[0].min_balance {
                return Err(WalletError::config(format!(
                    "tier thresholds must increase: {} ({}) after {} ({})",
                    pair[1].tier, pair[1].min_balance, pair[0].tier, pair[0].min_balance
                )));
            }
            if pair[1].tier <= pair[0].tier {
                return Err(WalletError::config(format!(
                    "tiers out of order: {} after {}",
                    pair[1].tier, pair[0].tier
                )));
            }
        }
        if let Some(bad) = tiers
            .iter()
            .find(|t| t.discount < Decimal::ZERO || t.discount > Decimal::ONE_HUNDRED)
        {
            return Err(WalletError::config(format!(
                "discount for {} must be within 0..=100, got {}",
                bad.tier, bad.discount
            )));
        }
        Ok(Self { tiers })
    }

    /// Tier rows, lowest first.
    #[must_use]
    pub fn tiers(&self) -> &[TierSpec] {
        &self.tiers
    }

    /// Look up a tier's row.
    #[must_use]
    pub fn spec(&self, tier: MembershipTier) -> Option<&TierSpec> {
        self.tiers.iter().find(|t| t.tier == tier)
    }

    /// Index of the highest tier whose threshold does not exceed `balance`.
    fn index_for(&self, balance: Amount) -> usize {
        self.tiers
            .iter()
            .rposition(|t| t.min_balance <= balance)
            .unwrap_or(0)
    }

    /// Resolve the tier for a COST balance.
    #[must_use]
    pub fn resolve(&self, cost_balance: Amount) -> TierStatus {
        let index = self.index_for(cost_balance);
        let current = &self.tiers[index];
        let next_tier = self.tiers.get(index + 1).map(|next| NextTier {
            tier: next.tier,
            tier_name: next.tier.name().to_string(),
            discount: next.discount,
            color: next.color.clone(),
            min_balance: next.min_balance,
            tokens_needed: next.min_balance.saturating_sub(cost_balance),
        });

        TierStatus {
            tier: current.tier,
            tier_name: current.tier.name().to_string(),
            discount: current.discount,
            color: current.color.clone(),
            icon: current.tier.icon().to_string(),
            min_balance: current.min_balance,
            cost_balance,
            next_tier,
        }
    }

    /// Public listing with display ranges.
    #[must_use]
    pub fn listing(&self) -> Vec<TierListing> {
        self.tiers
            .iter()
            .enumerate()
            .map(|(i, spec)| TierListing {
                tier: spec.tier,
                name: spec.tier.name().to_string(),
                min_balance: spec.min_balance,
                max_balance: self
                    .tiers
                    .get(i + 1)
                    .map(|next| next.min_balance.saturating_sub(Amount::from_units(1))),
                discount: spec.discount,
                color: spec.color.clone(),
            })
            .collect()
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierSpec::new(MembershipTier::Basic, 0, 10, "#808080"),
                TierSpec::new(MembershipTier::Bronze, 15_000, 20, "#CD7F32"),
                TierSpec::new(MembershipTier::Silver, 30_000, 30, "#C0C0C0"),
                TierSpec::new(MembershipTier::Gold, 50_000, 40, "#FFD700"),
                TierSpec::new(MembershipTier::Platinum, 100_000, 50, "#E5E4E2"),
            ],
        }
    }
}

impl TryFrom<Vec<TierSpec>> for TierTable {
    type Error = WalletError;

    fn try_from(tiers: Vec<TierSpec>) -> Result<Self> {
        Self::new(tiers)
    }
}

impl From<TierTable> for Vec<TierSpec> {
    fn from(table: TierTable) -> Self {
        table.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(0, MembershipTier::Basic ; "zero")]
    #[test_case(14_999, MembershipTier::Basic ; "just below bronze")]
    #[test_case(15_000, MembershipTier::Bronze ; "bronze threshold")]
    #[test_case(30_000, MembershipTier::Silver ; "silver threshold")]
    #[test_case(99_999, MembershipTier::Gold ; "just below platinum")]
    #[test_case(1_000_000, MembershipTier::Platinum ; "far above top")]
    fn test_resolve(balance: u64, expected: MembershipTier) {
        let status = TierTable::default().resolve(Amount::from_units(balance));
        assert_eq!(status.tier, expected);
    }

    #[test]
    fn test_silver_next_gold() {
        let status = TierTable::default().resolve(Amount::from_units(30_000));
        assert_eq!(status.tier, MembershipTier::Silver);
        let next = status.next_tier.expect("gold is next");
        assert_eq!(next.tier, MembershipTier::Gold);
        assert_eq!(next.tokens_needed, Amount::from_units(20_000));
    }

    #[test]
    fn test_top_tier_has_no_next() {
        let status = TierTable::default().resolve(Amount::from_units(250_000));
        assert!(status.next_tier.is_none());
        assert_eq!(status.progress_percent(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_progress_percent() {
        let status = TierTable::default().resolve(Amount::from_units(7_500));
        assert_eq!(status.progress_percent(), Decimal::new(50, 0));
    }

    #[test]
    fn test_fractional_balance_below_threshold() {
        let balance: Amount = "14999.999".parse().expect("amount");
        let status = TierTable::default().resolve(balance);
        assert_eq!(status.tier, MembershipTier::Basic);
        let next = status.next_tier.expect("bronze next");
        assert_eq!(next.tokens_needed, "0.001".parse().expect("amount"));
    }

    #[test]
    fn test_listing_ranges() {
        let listing = TierTable::default().listing();
        assert_eq!(listing.len(), 5);
        assert_eq!(listing[0].max_balance, Some(Amount::from_units(14_999)));
        assert_eq!(listing[4].max_balance, None);
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(TierTable::new(Vec::new()).is_err());
    }

    #[test]
    fn test_nonzero_start_rejected() {
        let tiers = vec![TierSpec::new(MembershipTier::Basic, 10, 10, "#000")];
        assert!(TierTable::new(tiers).is_err());
    }

    #[test]
    fn test_non_increasing_thresholds_rejected() {
        let tiers = vec![
            TierSpec::new(MembershipTier::Basic, 0, 10, "#000"),
            TierSpec::new(MembershipTier::Bronze, 0, 20, "#111"),
        ];
        assert!(TierTable::new(tiers).is_err());
    }

    #[test]
    fn test_discount_over_hundred_rejected() {
        let tiers = vec![TierSpec::new(MembershipTier::Basic, 0, 101, "#000")];
        assert!(TierTable::new(tiers).is_err());
    }

    #[test]
    fn test_table_serde_validates() {
        let json = r##"[{"tier":"gold","min_balance":"5","discount":"40","color":"#FFD700"}]"##;
        let result: std::result::Result<TierTable, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn tier_bounds_hold(units in 0u64..500_000, cents in 0u64..100) {
            let balance = Amount::from_parts(units * 100 + cents, 2).expect("amount");
            let status = TierTable::default().resolve(balance);
            prop_assert!(status.min_balance <= balance);
            if let Some(next) = &status.next_tier {
                prop_assert!(balance < next.min_balance);
                prop_assert_eq!(
                    next.tokens_needed.value(),
                    next.min_balance.value() - balance.value()
                );
            }
        }

        #[test]
        fn resolve_is_idempotent(units in 0u64..500_000) {
            let table = TierTable::default();
            let balance = Amount::from_units(units);
            prop_assert_eq!(table.resolve(balance), table.resolve(balance));
        }
    }
}
