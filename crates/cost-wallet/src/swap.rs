//! Currency swaps.
//!
//! A swap converts through fiat: `amount / rate(from) * rate(to)`, then the
//! fee is taken from the destination amount. The credited amount is
//! truncated to destination precision.

use crate::amount::Amount;
use crate::currency::Currency;
use crate::error::{Result, WalletError};
use crate::rates::ExchangeRates;
use crate::transaction::{SwapId, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat swap fee (1%).
pub const SWAP_FEE_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

fn default_fee_rate() -> Decimal {
    SWAP_FEE_RATE
}

/// Swap fee settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapPolicy {
    /// Fraction of the destination amount kept as fee.
    pub fee_rate: Decimal,
}

impl Default for SwapPolicy {
    fn default() -> Self {
        Self {
            fee_rate: SWAP_FEE_RATE,
        }
    }
}

impl SwapPolicy {
    /// Check the fee is in `[0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the fee rate is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.fee_rate.is_sign_negative() || self.fee_rate >= Decimal::ONE {
            return Err(WalletError::config(format!(
                "swap fee rate must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        Ok(())
    }
}

/// A request to convert one currency into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Currency debited.
    pub from_currency: Currency,
    /// Currency credited.
    pub to_currency: Currency,
    /// Amount of `from_currency` sent.
    pub amount: Amount,
}

impl SwapRequest {
    /// Create a swap request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrencyPair` if both currencies are the same and
    /// `InvalidAmount` if the amount is zero.
    pub fn new(from_currency: Currency, to_currency: Currency, amount: Amount) -> Result<Self> {
        let request = Self {
            from_currency,
            to_currency,
            amount,
        };
        request.validate()?;
        Ok(request)
    }

    /// Re-check a request that may not have come through [`SwapRequest::new`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrencyPair` if both currencies are the same and
    /// `InvalidAmount` if the amount is zero.
    pub fn validate(&self) -> Result<()> {
        if self.from_currency == self.to_currency {
            return Err(WalletError::invalid_pair(
                self.from_currency.code(),
                self.to_currency.code(),
            ));
        }
        if self.amount.is_zero() {
            return Err(WalletError::invalid_amount("swap amount must be greater than zero"));
        }
        Ok(())
    }

    /// Parse a swap request from user input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrencyPair` for unknown or equal currency codes and
    /// `InvalidAmount` for a non-numeric or non-positive amount.
    pub fn parse(from: &str, to: &str, amount: &str) -> Result<Self> {
        let pair = from
            .parse::<Currency>()
            .and_then(|f| to.parse::<Currency>().map(|t| (f, t)));
        let Ok((from_currency, to_currency)) = pair else {
            return Err(WalletError::invalid_pair(from.trim(), to.trim()));
        };
        if from_currency == to_currency {
            return Err(WalletError::invalid_pair(from_currency.code(), to_currency.code()));
        }
        Self::new(from_currency, to_currency, Amount::parse_positive(amount)?)
    }

    /// Fail unless `available` covers the amount sent.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` if `available` is below the amount.
    pub fn ensure_covered(&self, available: Amount) -> Result<()> {
        if self.amount > available {
            return Err(WalletError::insufficient_balance(
                self.from_currency,
                available.value(),
                self.amount.value(),
            ));
        }
        Ok(())
    }
}

/// Priced swap, before any balance moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    /// Currency debited.
    pub from_currency: Currency,
    /// Currency credited.
    pub to_currency: Currency,
    /// Amount debited.
    pub amount_sent: Amount,
    /// Units of `to_currency` per unit of `from_currency`.
    pub rate: Decimal,
    /// Destination amount before the fee.
    pub gross_amount: Amount,
    /// Fee fraction applied.
    pub fee_rate: Decimal,
    /// Fee kept, in `to_currency`.
    pub fee_amount: Amount,
    /// Amount credited.
    pub amount_received: Amount,
}

/// Price a swap. Pure; balances are not consulted.
///
/// # Errors
///
/// Returns `InvalidCurrencyPair` if a rate is missing and `InvalidAmount` if
/// the result rounds to nothing or overflows.
pub fn quote(request: &SwapRequest, rates: &ExchangeRates, fee_rate: Decimal) -> Result<SwapQuote> {
    let overflow = || WalletError::invalid_amount("swap amount out of range");
    let to = request.to_currency;

    let gross = rates.convert(request.amount, request.from_currency, to)?;
    let net = gross
        .checked_mul(Decimal::ONE - fee_rate)
        .ok_or_else(overflow)?;

    let gross_amount = Amount::new(gross)?.truncate_for(to);
    let amount_received = Amount::new(net)?.truncate_for(to);
    if amount_received.is_zero() {
        return Err(WalletError::invalid_amount(format!(
            "{} {} is too small to swap into {to}",
            request.amount, request.from_currency
        )));
    }
    let fee_amount = gross_amount.saturating_sub(amount_received);

    let rate = rates
        .rate(to)?
        .checked_div(rates.rate(request.from_currency)?)
        .ok_or_else(overflow)?;

    Ok(SwapQuote {
        from_currency: request.from_currency,
        to_currency: to,
        amount_sent: request.amount,
        rate,
        gross_amount,
        fee_rate,
        fee_amount,
        amount_received,
    })
}

/// Outcome of an executed swap.
///
/// Remote backends may report only the core fields; the rest default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResult {
    /// Shared id of the two ledger legs.
    #[serde(default)]
    pub swap_id: Option<SwapId>,
    /// Currency debited.
    pub from_currency: Currency,
    /// Currency credited.
    pub to_currency: Currency,
    /// Amount debited.
    pub amount_sent: Amount,
    /// Amount credited after the fee.
    pub amount_received: Amount,
    /// Fee fraction applied.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// Destination amount before the fee.
    #[serde(default)]
    pub gross_amount: Option<Amount>,
    /// Fee kept, in `to_currency`.
    #[serde(default)]
    pub fee_amount: Option<Amount>,
    /// Units of `to_currency` per unit of `from_currency`.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Source and destination ledger rows.
    #[serde(default)]
    pub legs: Vec<Transaction>,
}

impl SwapResult {
    /// Build the result of a settled quote.
    #[must_use]
    pub fn settled(swap_id: SwapId, quote: &SwapQuote, legs: Vec<Transaction>) -> Self {
        Self {
            swap_id: Some(swap_id),
            from_currency: quote.from_currency,
            to_currency: quote.to_currency,
            amount_sent: quote.amount_sent,
            amount_received: quote.amount_received,
            fee_rate: quote.fee_rate,
            gross_amount: Some(quote.gross_amount),
            fee_amount: Some(quote.fee_amount),
            rate: Some(quote.rate),
            legs,
        }
    }
}
