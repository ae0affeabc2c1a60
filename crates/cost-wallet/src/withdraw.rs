//! Withdrawal requests and their local validation.

use crate::amount::Amount;
use crate::currency::Currency;
use crate::error::{Result, WalletError};
use serde::{Deserialize, Serialize};

/// Length in bytes of a decoded wallet address.
pub const ADDRESS_LEN: usize = 32;

/// Where withdrawn funds go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WithdrawalDestination {
    /// Bank account, for fiat.
    Bank {
        /// Bank name.
        bank_name: String,
        /// Account number.
        account_number: String,
        /// Name on the account.
        account_name: String,
    },
    /// On-chain wallet, for crypto currencies.
    Crypto {
        /// Base58 wallet address.
        #[serde(rename = "solana_address")]
        address: String,
    },
}

impl WithdrawalDestination {
    /// Bank destination.
    #[must_use]
    pub fn bank(
        bank_name: impl Into<String>,
        account_number: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self::Bank {
            bank_name: bank_name.into(),
            account_number: account_number.into(),
            account_name: account_name.into(),
        }
    }

    /// Wallet destination.
    #[must_use]
    pub fn crypto(address: impl Into<String>) -> Self {
        Self::Crypto {
            address: address.into(),
        }
    }

    /// Short label used in ledger descriptions.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Bank {
                bank_name,
                account_number,
                ..
            } => format!("{} - {}", bank_name.trim(), account_number.trim()),
            Self::Crypto { address } => address.trim().to_string(),
        }
    }
}

/// A request to move funds out of the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Amount to withdraw.
    pub amount: Amount,
    /// Currency withdrawn.
    pub currency: Currency,
    /// Payout destination.
    #[serde(flatten)]
    pub destination: WithdrawalDestination,
}

impl WithdrawalRequest {
    /// Create a request.
    #[must_use]
    pub const fn new(amount: Amount, currency: Currency, destination: WithdrawalDestination) -> Self {
        Self {
            amount,
            currency,
            destination,
        }
    }

    /// Check the request before it is sent anywhere.
    ///
    /// Fiat needs a complete bank triple; crypto needs a well-formed address.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a zero amount and `Validation` naming the
    /// first missing or malformed destination field.
    pub fn validate(&self) -> Result<()> {
        if self.amount.is_zero() {
            return Err(WalletError::invalid_amount("withdrawal amount must be greater than zero"));
        }
        match (&self.destination, self.currency) {
            (
                WithdrawalDestination::Bank {
                    bank_name,
                    account_number,
                    account_name,
                },
                Currency::Fiat,
            ) => {
                require("bank_name", bank_name)?;
                require("account_number", account_number)?;
                require("account_name", account_name)?;
                if !account_number.trim().chars().all(|c| c.is_ascii_digit()) {
                    return Err(WalletError::validation(
                        "account_number",
                        "account number must contain digits only",
                    ));
                }
                Ok(())
            }
            (WithdrawalDestination::Crypto { address }, currency) if currency.is_crypto() => {
                require("address", address)?;
                validate_address(address.trim())
            }
            (WithdrawalDestination::Crypto { .. }, _) => Err(WalletError::validation(
                "destination",
                "fiat withdrawals require bank details",
            )),
            (WithdrawalDestination::Bank { .. }, currency) => Err(WalletError::validation(
                "destination",
                format!("{currency} withdrawals require a wallet address"),
            )),
        }
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WalletError::validation(field, "is required"));
    }
    Ok(())
}

fn validate_address(address: &str) -> Result<()> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| WalletError::validation("address", format!("not valid base58: {e}")))?;
    if bytes.len() != ADDRESS_LEN {
        return Err(WalletError::validation(
            "address",
            format!("expected {ADDRESS_LEN} bytes, got {}", bytes.len()),
        ));
    }
    Ok(())
}
