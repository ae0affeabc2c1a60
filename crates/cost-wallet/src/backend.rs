//! The authority that owns wallet state.

use crate::amount::Amount;
use crate::balance::WalletBalance;
use crate::currency::Currency;
use crate::discount::DiscountInfo;
use crate::error::Result;
use crate::swap::{SwapRequest, SwapResult};
use crate::transaction::Transaction;
use crate::withdraw::WithdrawalRequest;
use std::future::Future;

/// Operations the wallet authority exposes.
///
/// Implemented by [`crate::LocalLedger`] (in-process) and
/// [`crate::HttpBackend`] (remote REST API).
pub trait WalletBackend: Send + Sync {
    /// Current balances and membership.
    fn get_balance(&self) -> impl Future<Output = Result<WalletBalance>> + Send;

    /// Current per-currency discounts.
    fn get_discount_info(&self) -> impl Future<Output = Result<DiscountInfo>> + Send;

    /// Ledger rows, most recent first.
    fn list_transactions(&self) -> impl Future<Output = Result<Vec<Transaction>>> + Send;

    /// Credit funds.
    fn deposit(
        &self,
        amount: Amount,
        currency: Currency,
    ) -> impl Future<Output = Result<Transaction>> + Send;

    /// Send funds out.
    fn withdraw(
        &self,
        request: &WithdrawalRequest,
    ) -> impl Future<Output = Result<Transaction>> + Send;

    /// Convert between currencies.
    fn swap(&self, request: &SwapRequest) -> impl Future<Output = Result<SwapResult>> + Send;
}
