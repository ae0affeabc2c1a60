//! Wallet balances.

use crate::amount::Amount;
use crate::currency::{Currency, LocalCurrency};
use crate::error::{Result, WalletError};
use crate::rates::ExchangeRates;
use crate::tier::{TierStatus, TierTable};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Holdings in each currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holdings {
    /// Local fiat.
    pub fiat: Amount,
    /// SOL.
    pub sol: Amount,
    /// USDT.
    pub usdt: Amount,
    /// COST.
    pub cost: Amount,
}

impl Holdings {
    /// Balance of one currency.
    #[must_use]
    pub const fn get(&self, currency: Currency) -> Amount {
        match currency {
            Currency::Fiat => self.fiat,
            Currency::Sol => self.sol,
            Currency::Usdt => self.usdt,
            Currency::Cost => self.cost,
        }
    }

    fn slot(&mut self, currency: Currency) -> &mut Amount {
        match currency {
            Currency::Fiat => &mut self.fiat,
            Currency::Sol => &mut self.sol,
            Currency::Usdt => &mut self.usdt,
            Currency::Cost => &mut self.cost,
        }
    }

    /// Add to a balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` on overflow; the holdings are unchanged.
    pub fn credit(&mut self, currency: Currency, amount: Amount) -> Result<()> {
        let slot = self.slot(currency);
        *slot = slot
            .checked_add(amount)
            .ok_or_else(|| WalletError::invalid_amount("balance overflow"))?;
        Ok(())
    }

    /// Take from a balance.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` if the balance is too low; the holdings
    /// are unchanged.
    pub fn debit(&mut self, currency: Currency, amount: Amount) -> Result<()> {
        let slot = self.slot(currency);
        *slot = slot.checked_sub(amount).ok_or_else(|| {
            WalletError::insufficient_balance(currency, slot.value(), amount.value())
        })?;
        Ok(())
    }

    /// Sum of all balances in fiat, rounded to fiat precision.
    ///
    /// # Errors
    ///
    /// Returns error if a held currency has no rate.
    pub fn total_in_fiat(&self, rates: &ExchangeRates) -> Result<Amount> {
        let mut total = Decimal::ZERO;
        for currency in Currency::ALL {
            let held = self.get(currency);
            if held.is_zero() {
                continue;
            }
            total = total
                .checked_add(rates.to_fiat(held, currency)?)
                .ok_or_else(|| WalletError::invalid_amount("balance overflow"))?;
        }
        Ok(Amount::new(total)?.round_for(Currency::Fiat))
    }
}

/// Snapshot of a wallet as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Local fiat balance.
    pub fiat_balance: Amount,
    /// SOL balance.
    pub sol_balance: Amount,
    /// USDT balance.
    pub usdt_balance: Amount,
    /// COST balance.
    pub cost_balance: Amount,
    /// Sum of all balances converted to fiat.
    pub total_in_fiat: Amount,
    /// Loyalty reward counter.
    pub loyalty_points: u64,
    /// What `FIAT` means for this account.
    #[serde(default)]
    pub currency: LocalCurrency,
    /// Rates used for `total_in_fiat`.
    #[serde(default)]
    pub exchange_rates: ExchangeRates,
    /// Membership resolved from the COST balance.
    pub membership: TierStatus,
    /// First deposit, if any.
    #[serde(default)]
    pub first_deposit_at: Option<DateTime<Utc>>,
}

impl WalletBalance {
    /// Assemble a snapshot from holdings.
    ///
    /// # Errors
    ///
    /// Returns error if a held currency has no exchange rate.
    pub fn from_holdings(
        holdings: &Holdings,
        loyalty_points: u64,
        currency: LocalCurrency,
        exchange_rates: ExchangeRates,
        tiers: &TierTable,
        first_deposit_at: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        Ok(Self {
            fiat_balance: holdings.fiat,
            sol_balance: holdings.sol,
            usdt_balance: holdings.usdt,
            cost_balance: holdings.cost,
            total_in_fiat: holdings.total_in_fiat(&exchange_rates)?,
            loyalty_points,
            currency,
            exchange_rates,
            membership: tiers.resolve(holdings.cost),
            first_deposit_at,
        })
    }

    /// Balances as holdings.
    #[must_use]
    pub const fn holdings(&self) -> Holdings {
        Holdings {
            fiat: self.fiat_balance,
            sol: self.sol_balance,
            usdt: self.usdt_balance,
            cost: self.cost_balance,
        }
    }

    /// Balance of one currency.
    #[must_use]
    pub const fn balance_of(&self, currency: Currency) -> Amount {
        self.holdings().get(currency)
    }
}
