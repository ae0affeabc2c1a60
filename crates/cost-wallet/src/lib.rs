//! # cost-wallet
//!
//! Wallet and membership engine for the campus marketplace.
//!
//! This crate provides:
//! - Balances in local fiat, SOL, USDT and the COST loyalty token
//! - Membership tiers resolved from COST holdings
//! - Per-currency discounts, with the COST discount decaying over the first year
//! - Currency swaps with a flat fee taken from the destination amount
//! - An in-memory authoritative ledger and an HTTP client for the remote API
//! - A session that validates locally and rejects duplicate submissions
//!
//! ## Example
//!
//! ```rust,no_run
//! use cost_wallet::{Amount, Currency, LedgerSettings, LocalLedger, SwapRequest, WalletSession};
//!
//! # async fn example() -> cost_wallet::Result<()> {
//! let ledger = LocalLedger::open_account("Ada Obi", LedgerSettings::default())?;
//! let session = WalletSession::new(ledger);
//!
//! session.deposit(Amount::from_units(100), Currency::Fiat).await?;
//! let swap = SwapRequest::new(Currency::Fiat, Currency::Cost, Amount::from_units(100))?;
//! let result = session.swap(&swap).await?;
//! println!("received {} COST", result.amount_received);
//!
//! let balance = session.balance().await?;
//! println!("tier: {}", balance.membership.tier_name);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod backend;
pub mod balance;
pub mod classify;
pub mod config;
pub mod currency;
pub mod discount;
pub mod error;
pub mod http;
pub mod ledger;
pub mod rates;
pub mod session;
pub mod storage;
pub mod swap;
pub mod tier;
pub mod transaction;
pub mod withdraw;

pub use amount::Amount;
pub use backend::WalletBackend;
pub use balance::{Holdings, WalletBalance};
pub use classify::{classify, signed_amount, Classification, Direction, Tone};
pub use config::{StorageKind, WalletConfig};
pub use currency::{Currency, LocalCurrency};
pub use discount::{apply_discount, DecayCurve, DiscountInfo, DiscountPolicy, DiscountedPrice};
pub use error::{Result, WalletError};
pub use http::HttpBackend;
pub use ledger::{LedgerSettings, LocalLedger};
pub use rates::ExchangeRates;
pub use session::{Snapshot, WalletSession, DEFAULT_RECENT_LIMIT};
pub use storage::{EncryptedFileStorage, MasterKey, MemorySecretStorage, SecretStorage, AUTH_TOKEN_KEY};
pub use swap::{quote, SwapPolicy, SwapQuote, SwapRequest, SwapResult, SWAP_FEE_RATE};
pub use tier::{MembershipTier, NextTier, TierListing, TierStatus, TierTable};
pub use transaction::{SwapId, SwapLeg, Transaction, TransactionId, TransactionStatus, TransactionType};
pub use withdraw::{WithdrawalDestination, WithdrawalRequest};
