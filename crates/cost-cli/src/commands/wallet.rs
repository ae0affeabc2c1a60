//! Wallet command implementation.
//!
//! Runs every balance, discount and money-moving subcommand against a
//! [`WalletSession`], whatever backend it wraps.

use std::io::Write;

use cost_wallet::{
    Amount, Currency, SwapRequest, TierTable, WalletBackend, WalletSession, WithdrawalDestination,
    WithdrawalRequest,
};
use tracing::debug;

use crate::cli::{Commands, SwapArgs, WithdrawArgs};
use crate::error::CliError;
use crate::output::{OutputFormat, TierList, TransactionList};

/// Wallet command executor.
pub struct WalletCommand<B> {
    session: WalletSession<B>,
    tiers: TierTable,
}

impl<B: WalletBackend> WalletCommand<B> {
    /// Create a command over `session`; `tiers` backs the `tiers` listing.
    #[must_use]
    pub const fn new(session: WalletSession<B>, tiers: TierTable) -> Self {
        Self { session, tiers }
    }

    /// Session the command runs against.
    #[must_use]
    pub const fn session(&self) -> &WalletSession<B> {
        &self.session
    }

    /// Execute a wallet subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid or the wallet rejects
    /// the operation.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &Commands,
    ) -> Result<(), CliError> {
        match command {
            Commands::Balance => {
                let balance = self.session.balance().await?;
                format.write(writer, &balance)?;
            }
            Commands::Discount => {
                let info = self.session.discount_info().await?;
                format.write(writer, &info)?;
            }
            Commands::Transactions { limit } => {
                let rows = self.session.recent_transactions(*limit).await?;
                format.write(writer, &TransactionList::new(&rows))?;
            }
            Commands::Deposit { amount, currency } => {
                let amount = Amount::parse_positive(amount)?;
                let currency = parse_currency(currency)?;
                let tx = self.session.deposit(amount, currency).await?;
                format.write(writer, &tx)?;
            }
            Commands::Withdraw(args) => {
                let request = withdrawal_request(args)?;
                let tx = self.session.withdraw(&request).await?;
                format.write(writer, &tx)?;
            }
            Commands::Swap(args) => {
                let request = swap_request(args)?;
                let result = self.session.swap(&request).await?;
                format.write(writer, &result)?;
            }
            Commands::Quote(args) => {
                let request = swap_request(args)?;
                let quote = self.session.quote_swap(&request).await?;
                format.write(writer, &quote)?;
            }
            Commands::Tiers => {
                let list = TierList {
                    tiers: self.tiers.listing(),
                };
                format.write(writer, &list)?;
            }
            Commands::Token { .. } => {
                return Err(CliError::Command(
                    "token commands are handled without a wallet session".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Parse a currency code.
fn parse_currency(code: &str) -> Result<Currency, CliError> {
    Ok(code.parse::<Currency>()?)
}

fn swap_request(args: &SwapArgs) -> Result<SwapRequest, CliError> {
    Ok(SwapRequest::parse(&args.from, &args.to, &args.amount)?)
}

/// Build a withdrawal from flags. Missing details are left blank so that
/// request validation names the offending field.
fn withdrawal_request(args: &WithdrawArgs) -> Result<WithdrawalRequest, CliError> {
    let amount = Amount::parse_positive(&args.amount)?;
    let currency = parse_currency(&args.currency)?;
    let destination = if currency.is_crypto() {
        WithdrawalDestination::crypto(args.address.clone().unwrap_or_default())
    } else {
        WithdrawalDestination::bank(
            args.bank_name.clone().unwrap_or_default(),
            args.account_number.clone().unwrap_or_default(),
            args.account_name.clone().unwrap_or_default(),
        )
    };
    debug!(currency = %currency, destination = %destination.label(), "withdrawal request built");
    Ok(WithdrawalRequest::new(amount, currency, destination))
}
