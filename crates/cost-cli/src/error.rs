//! CLI error types.

use std::fmt;

use cost_wallet::WalletError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Backend unreachable.
    Connection(String),
    /// Invalid configuration.
    Config(String),
    /// Command rejected by the wallet.
    Command(String),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "connection error: {msg}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Command(msg) => write!(f, "command error: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<WalletError> for CliError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::RemoteFailure { status: None, .. } => Self::Connection(err.to_string()),
            WalletError::Config { .. } => Self::Config(err.to_string()),
            WalletError::InvalidAmount { .. }
            | WalletError::InvalidCurrencyPair { .. }
            | WalletError::Validation { .. } => Self::InvalidArgument(err.to_string()),
            WalletError::Io(e) => Self::Io(e),
            other => Self::Command(other.to_string()),
        }
    }
}
