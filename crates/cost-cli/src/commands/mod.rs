//! CLI command implementations.
//!
//! - [`wallet`] - Balances, discounts, deposits, withdrawals and swaps
//! - [`token`] - Stored backend token

pub mod token;
pub mod wallet;

pub use token::TokenCommand;
pub use wallet::WalletCommand;
