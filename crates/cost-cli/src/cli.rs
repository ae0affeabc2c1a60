//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Default number of rows shown by `transactions`.
pub const DEFAULT_LIMIT: usize = 10;

/// COST wallet - balances, membership tiers and swaps.
#[derive(Parser, Debug, Clone)]
#[command(name = "costwallet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend URL; overrides `backend.url` from the config file.
    #[arg(short, long, env = "COSTWALLET_BACKEND")]
    pub backend: Option<String>,

    /// Use an in-process ledger instead of the remote backend.
    ///
    /// The ledger lives only for the duration of the command.
    #[arg(long, conflicts_with = "backend")]
    pub local: bool,

    /// Path to a TOML config file.
    #[arg(short, long, env = "COSTWALLET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show balances and membership.
    Balance,

    /// Show active discounts per currency.
    Discount,

    /// List recent transactions, newest first.
    Transactions {
        /// Maximum rows to show.
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Deposit funds.
    Deposit {
        /// Amount to deposit.
        amount: String,

        /// Currency code (FIAT, SOL, USDT, COST).
        #[arg(short, long, default_value = "FIAT")]
        currency: String,
    },

    /// Withdraw funds to a bank account or wallet address.
    ///
    /// FIAT needs the bank details; SOL, USDT and COST need an address.
    Withdraw(WithdrawArgs),

    /// Swap one currency for another.
    Swap(SwapArgs),

    /// Price a swap without executing it.
    Quote(SwapArgs),

    /// List membership tiers.
    Tiers,

    /// Manage the stored backend token.
    Token {
        /// Token subcommand to execute.
        #[command(subcommand)]
        command: TokenCommands,
    },
}

/// Arguments for the withdraw command.
#[derive(Parser, Debug, Clone)]
pub struct WithdrawArgs {
    /// Amount to withdraw.
    pub amount: String,

    /// Currency code (FIAT, SOL, USDT, COST).
    #[arg(short, long, default_value = "FIAT")]
    pub currency: String,

    /// Destination bank.
    #[arg(long)]
    pub bank_name: Option<String>,

    /// Destination account number.
    #[arg(long)]
    pub account_number: Option<String>,

    /// Name on the destination account.
    #[arg(long)]
    pub account_name: Option<String>,

    /// Destination wallet address (base58).
    #[arg(long)]
    pub address: Option<String>,
}

/// Arguments for swap and quote.
#[derive(Parser, Debug, Clone)]
pub struct SwapArgs {
    /// Currency to pay with.
    pub from: String,

    /// Currency to receive.
    pub to: String,

    /// Amount of `from` to send.
    pub amount: String,
}

/// Token subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum TokenCommands {
    /// Store a bearer token for the backend.
    Set {
        /// Token value.
        value: String,
    },

    /// Remove the stored token.
    Clear,
}
