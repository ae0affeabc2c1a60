//! # cost-cli
//!
//! Command-line front end for the COST wallet.
//!
//! Provides commands for:
//! - Balances, membership tier and per-currency discounts
//! - Recent transactions
//! - Deposits, withdrawals and swaps
//! - Managing the stored backend token
//!
//! # Architecture
//!
//! Every wallet command runs through a [`cost_wallet::WalletSession`]. The
//! session wraps either the remote HTTP backend or, with `--local`, an
//! in-process ledger that lives for a single invocation.
//!
//! ```text
//! ┌────────────┐      REST/JSON       ┌─────────────────┐
//! │ costwallet │◄────────────────────►│  market backend │
//! └────────────┘   (bearer token)     └─────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format, SwapArgs, TokenCommands, WithdrawArgs};
pub use error::CliError;
pub use output::OutputFormat;
