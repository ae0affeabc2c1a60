//! Exchange rates between wallet currencies.
//!
//! Rates are quoted as units of a currency per one unit of local fiat, so
//! fiat is the common unit every conversion passes through.

use crate::amount::Amount;
use crate::currency::Currency;
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Exchange-rate table keyed by currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Currency, Decimal>", into = "BTreeMap<Currency, Decimal>")]
pub struct ExchangeRates(BTreeMap<Currency, Decimal>);

impl ExchangeRates {
    /// Build a table from `(currency, units per fiat)` pairs.
    ///
    /// The fiat rate is always 1 and is inserted if missing.
    ///
    /// # Errors
    ///
    /// Returns error if any rate is not strictly positive or fiat is not 1.
    pub fn new(rates: impl IntoIterator<Item = (Currency, Decimal)>) -> Result<Self> {
        let mut table: BTreeMap<Currency, Decimal> = rates.into_iter().collect();
        table.entry(Currency::Fiat).or_insert(Decimal::ONE);

        for (currency, rate) in &table {
            if *rate <= Decimal::ZERO {
                return Err(WalletError::config(format!(
                    "exchange rate for {currency} must be positive, got {rate}"
                )));
            }
        }
        if table.get(&Currency::Fiat) != Some(&Decimal::ONE) {
            return Err(WalletError::config("exchange rate for FIAT must be 1"));
        }
        Ok(Self(table))
    }

    /// Units of `currency` per one unit of fiat.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrencyPair` if no rate is published for `currency`.
    pub fn rate(&self, currency: Currency) -> Result<Decimal> {
        self.0
            .get(&currency)
            .copied()
            .ok_or_else(|| WalletError::invalid_pair(currency.code(), "FIAT"))
    }

    /// Whether a rate is published for `currency`.
    #[must_use]
    pub fn contains(&self, currency: Currency) -> bool {
        self.0.contains_key(&currency)
    }

    /// Value of `amount` of `currency` expressed in fiat (unrounded).
    ///
    /// # Errors
    ///
    /// Returns error if the currency has no rate or the value overflows.
    pub fn to_fiat(&self, amount: Amount, currency: Currency) -> Result<Decimal> {
        let rate = self.rate(currency)?;
        amount
            .value()
            .checked_div(rate)
            .ok_or_else(|| WalletError::invalid_amount("amount out of range"))
    }

    /// Convert `amount` of `from` into `to` at the published rates (no fee, unrounded).
    ///
    /// # Errors
    ///
    /// Returns error if either currency has no rate or the value overflows.
    pub fn convert(&self, amount: Amount, from: Currency, to: Currency) -> Result<Decimal> {
        let in_fiat = self.to_fiat(amount, from)?;
        in_fiat
            .checked_mul(self.rate(to)?)
            .ok_or_else(|| WalletError::invalid_amount("amount out of range"))
    }

    /// Iterate over `(currency, rate)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Currency, Decimal)> + '_ {
        self.0.iter().map(|(c, r)| (*c, *r))
    }
}

impl TryFrom<BTreeMap<Currency, Decimal>> for ExchangeRates {
    type Error = WalletError;

    fn try_from(rates: BTreeMap<Currency, Decimal>) -> Result<Self> {
        Self::new(rates)
    }
}

impl From<ExchangeRates> for BTreeMap<Currency, Decimal> {
    fn from(rates: ExchangeRates) -> Self {
        rates.0
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Currency::Fiat, Decimal::ONE),
            (Currency::Sol, Decimal::new(43, 7)),
            (Currency::Usdt, Decimal::new(65, 5)),
            (Currency::Cost, Decimal::new(20, 0)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> ExchangeRates {
        ExchangeRates::new([(Currency::Cost, Decimal::new(20, 0)), (Currency::Usdt, Decimal::new(5, 1))])
            .expect("valid rates")
    }

    #[test]
    fn test_fiat_inserted() {
        let r = rates();
        assert_eq!(r.rate(Currency::Fiat).expect("fiat"), Decimal::ONE);
    }

    #[test]
    fn test_non_positive_rejected() {
        let result = ExchangeRates::new([(Currency::Sol, Decimal::ZERO)]);
        assert!(matches!(result, Err(WalletError::Config { .. })));
    }

    #[test]
    fn test_fiat_must_be_one() {
        let result = ExchangeRates::new([(Currency::Fiat, Decimal::new(2, 0))]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_rate_is_invalid_pair() {
        let err = rates().rate(Currency::Sol).unwrap_err();
        assert!(matches!(err, WalletError::InvalidCurrencyPair { .. }));
    }

    #[test]
    fn test_to_fiat() {
        let value = rates().to_fiat(Amount::from_units(40), Currency::Cost).expect("convert");
        assert_eq!(value, Decimal::new(2, 0));
    }

    #[test]
    fn test_convert_through_fiat() {
        let value = rates()
            .convert(Amount::from_units(1), Currency::Usdt, Currency::Cost)
            .expect("convert");
        assert_eq!(value, Decimal::new(40, 0));
    }

    #[test]
    fn test_default_has_all_currencies() {
        let r = ExchangeRates::default();
        for currency in Currency::ALL {
            assert!(r.contains(currency));
        }
    }

    #[test]
    fn test_serialized_as_map() {
        let json = serde_json::to_value(rates()).expect("serialize");
        assert!(json.get("COST").is_some());
        assert!(json.get("FIAT").is_some());
    }

    #[test]
    fn test_deserialize_validates() {
        let r: ExchangeRates = serde_json::from_str(r#"{"COST": "20", "SOL": 0.5}"#).expect("deserialize");
        assert_eq!(r.rate(Currency::Fiat).expect("fiat"), Decimal::ONE);

        let bad = serde_json::from_str::<ExchangeRates>(r#"{"USDT": "-1"}"#);
        assert!(bad.is_err());
    }
}
