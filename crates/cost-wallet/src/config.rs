//! Wallet configuration.
//!
//! Loaded from TOML. Every section is optional and falls back to defaults:
//!
//! ```toml
//! [backend]
//! url = "https://market.example.com"
//! timeout_secs = 30
//!
//! [storage]
//! kind = "encrypted-file"
//! path = "/home/ada/.costwallet/secrets.json"
//!
//! [rates]
//! SOL = "0.0000043"
//! USDT = "0.00065"
//! COST = "20"
//!
//! [discount]
//! flat_rate = 5
//! floor_rate = 15
//! window_days = 365
//! curve = { kind = "step", steps = 4 }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::currency::{Currency, LocalCurrency};
use crate::discount::DiscountPolicy;
use crate::error::{Result, WalletError};
use crate::http::HttpBackend;
use crate::ledger::{LedgerSettings, LocalLedger};
use crate::rates::ExchangeRates;
use crate::storage::{EncryptedFileStorage, MasterKey, MemorySecretStorage, SecretStorage};
use crate::swap::SwapPolicy;
use crate::tier::TierTable;

/// Remote backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Server root; the API lives under `<url>/api`.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8001".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Which secret storage backs the session token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    /// Kept in memory for the life of the process.
    Memory,
    /// Encrypted file on disk.
    #[default]
    EncryptedFile,
}

/// Secret storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backing to use.
    pub kind: StorageKind,
    /// Secrets file for `encrypted-file`.
    pub path: PathBuf,
    /// Master key file; defaults to `path` with a `.key` extension.
    pub key_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            path: PathBuf::from(".costwallet/secrets.json"),
            key_path: None,
        }
    }
}

impl StorageConfig {
    /// Master key file location.
    #[must_use]
    pub fn key_path(&self) -> PathBuf {
        self.key_path
            .clone()
            .unwrap_or_else(|| self.path.with_extension("key"))
    }

    /// Open the configured storage.
    ///
    /// # Errors
    ///
    /// Returns error if the master key cannot be loaded or created.
    pub fn open(&self) -> Result<Arc<dyn SecretStorage>> {
        Ok(match self.kind {
            StorageKind::Memory => Arc::new(MemorySecretStorage::new()),
            StorageKind::EncryptedFile => {
                let key = MasterKey::load_or_create(&self.key_path())?;
                Arc::new(EncryptedFileStorage::new(self.path.clone(), key))
            }
        })
    }
}

/// Settings for the in-process ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Account holder; bank withdrawals must match this name.
    pub holder_name: String,
    /// COST credited when the account is opened.
    pub welcome_bonus: Amount,
    /// COST credited per redeemed loyalty point.
    pub point_value: Amount,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            holder_name: "Wallet Holder".to_string(),
            welcome_bonus: Amount::from_units(10),
            point_value: Amount::from_units(1),
        }
    }
}

/// Complete wallet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Remote backend.
    pub backend: BackendConfig,
    /// Secret storage.
    pub storage: StorageConfig,
    /// Local currency descriptor.
    pub currency: LocalCurrency,
    /// Exchange rates, units per one fiat.
    pub rates: ExchangeRates,
    /// Membership tiers.
    pub tiers: TierTable,
    /// Discount policy.
    pub discount: DiscountPolicy,
    /// Swap fee.
    pub swap: SwapPolicy,
    /// In-process ledger.
    pub ledger: LedgerConfig,
}

impl WalletConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WalletError::config(format!(
                "failed to read config file '{}': {e}",
                path.as_ref().display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| WalletError::config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let url = self.backend.url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WalletError::config("backend.url must start with http:// or https://"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(WalletError::config("backend.timeout_secs must be greater than 0"));
        }

        ExchangeRates::new(self.rates.iter())?;
        if let Some(missing) = Currency::ALL.into_iter().find(|c| !self.rates.contains(*c)) {
            return Err(WalletError::config(format!("rates.{missing} is missing")));
        }

        self.discount.validate()?;
        self.swap.validate()?;

        if self.ledger.holder_name.trim().is_empty() {
            return Err(WalletError::config("ledger.holder_name cannot be empty"));
        }
        Ok(())
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Rules for an in-process ledger.
    #[must_use]
    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            currency: self.currency.clone(),
            rates: self.rates.clone(),
            tiers: self.tiers.clone(),
            discount: self.discount.clone(),
            swap: self.swap,
            welcome_bonus: self.ledger.welcome_bonus,
            point_value: self.ledger.point_value,
        }
    }

    /// Open an in-process ledger for the configured holder.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the holder name is blank.
    pub fn local_ledger(&self) -> Result<LocalLedger> {
        LocalLedger::open_account(self.ledger.holder_name.clone(), self.ledger_settings())
    }

    /// Build the HTTP backend, using `storage` for the bearer token.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the client cannot be built.
    pub fn http_backend(&self, storage: Arc<dyn SecretStorage>) -> Result<HttpBackend> {
        Ok(HttpBackend::new(self.backend.url.clone(), self.timeout(), storage)?
            .with_currency(self.currency.clone())
            .with_rates(self.rates.clone())
            .with_tiers(self.tiers.clone()))
    }
}
