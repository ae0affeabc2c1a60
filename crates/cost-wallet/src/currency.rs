//! Currencies held by a wallet.

use crate::error::{Result, WalletError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A currency a wallet can hold.
///
/// `Fiat` resolves to the account's local currency (see [`LocalCurrency`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Local fiat currency.
    Fiat,
    /// Solana native coin.
    Sol,
    /// Tether stable-coin.
    Usdt,
    /// COST loyalty/utility token.
    Cost,
}

impl Currency {
    /// All currencies, in display order.
    pub const ALL: [Self; 4] = [Self::Fiat, Self::Sol, Self::Usdt, Self::Cost];

    /// Currency code as used on the wire.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Fiat => "FIAT",
            Self::Sol => "SOL",
            Self::Usdt => "USDT",
            Self::Cost => "COST",
        }
    }

    /// Number of decimal places amounts in this currency are rounded to.
    #[must_use]
    pub const fn precision(&self) -> u32 {
        match self {
            Self::Fiat | Self::Usdt => 2,
            Self::Sol | Self::Cost => 9,
        }
    }

    /// Whether withdrawals of this currency go to an on-chain address.
    #[must_use]
    pub const fn is_crypto(&self) -> bool {
        !matches!(self, Self::Fiat)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIAT" => Ok(Self::Fiat),
            "SOL" => Ok(Self::Sol),
            "USDT" => Ok(Self::Usdt),
            "COST" => Ok(Self::Cost),
            other => Err(WalletError::validation(
                "currency",
                format!("unrecognized currency code '{other}'"),
            )),
        }
    }
}

/// Descriptor of the local currency `Fiat` stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCurrency {
    /// ISO code, e.g. `NGN`.
    pub code: String,
    /// Display symbol, e.g. `₦`.
    pub symbol: String,
    /// Display name, e.g. `Naira`.
    pub name: String,
}

impl Default for LocalCurrency {
    fn default() -> Self {
        Self {
            code: "NGN".to_string(),
            symbol: "₦".to_string(),
            name: "Naira".to_string(),
        }
    }
}
