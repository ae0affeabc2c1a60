//! Error types for wallet operations.

use crate::currency::Currency;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias for wallet operations.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Amount is non-positive, non-numeric or out of range.
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },

    /// Insufficient balance for operation.
    #[error("insufficient balance: have {have} {currency}, need {need} {currency}")]
    InsufficientBalance {
        /// Currency being spent.
        currency: Currency,
        /// Current balance.
        have: Decimal,
        /// Required balance.
        need: Decimal,
    },

    /// Swap between the same currency or an unknown currency code.
    #[error("invalid currency pair: {from} -> {to}")]
    InvalidCurrencyPair {
        /// Source currency code as given.
        from: String,
        /// Destination currency code as given.
        to: String,
    },

    /// Required request fields are missing or malformed.
    #[error("validation error: {field}: {message}")]
    Validation {
        /// Offending field.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// The backend rejected the request or could not be reached.
    #[error("remote failure: {message}")]
    RemoteFailure {
        /// HTTP status, when the backend answered.
        status: Option<u16>,
        /// Message passed through from the backend.
        message: String,
    },

    /// Another balance-changing request is still in flight.
    #[error("busy: {operation} already in progress")]
    Busy {
        /// Operation that is in flight.
        operation: String,
    },

    /// Secret storage failure.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WalletError {
    /// Create an invalid amount error.
    #[must_use]
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    /// Create an insufficient balance error.
    #[must_use]
    pub fn insufficient_balance(currency: Currency, have: Decimal, need: Decimal) -> Self {
        Self::InsufficientBalance {
            currency,
            have,
            need,
        }
    }

    /// Create an invalid currency pair error.
    #[must_use]
    pub fn invalid_pair(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidCurrencyPair {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a remote failure.
    #[must_use]
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteFailure {
            status,
            message: message.into(),
        }
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is a request validation failure rather than a
    /// transport, storage or backend failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::InsufficientBalance { .. }
                | Self::InvalidCurrencyPair { .. }
                | Self::Validation { .. }
                | Self::Busy { .. }
        )
    }
}
