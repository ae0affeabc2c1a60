//! Client-side wallet session.
//!
//! A session wraps one backend, keeps the last balance and discount
//! snapshot, validates requests before they leave the process and refuses
//! a second balance-changing call while one is in flight.

use crate::amount::Amount;
use crate::backend::WalletBackend;
use crate::balance::WalletBalance;
use crate::currency::Currency;
use crate::discount::{apply_discount, DiscountInfo, DiscountedPrice};
use crate::error::{Result, WalletError};
use crate::swap::{quote, SwapPolicy, SwapQuote, SwapRequest, SwapResult};
use crate::transaction::Transaction;
use crate::withdraw::WithdrawalRequest;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Number of rows `recent_transactions` shows by default.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Last state fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Balances and membership.
    pub balance: WalletBalance,
    /// Discounts in effect.
    pub discount: DiscountInfo,
    /// When the snapshot was taken.
    pub refreshed_at: DateTime<Utc>,
}

/// Clears the in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, operation: &str) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WalletError::Busy {
                operation: operation.to_string(),
            })?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wallet session over a backend.
#[derive(Debug)]
pub struct WalletSession<B> {
    backend: B,
    swap_policy: SwapPolicy,
    snapshot: RwLock<Option<Snapshot>>,
    in_flight: AtomicBool,
}

impl<B: WalletBackend> WalletSession<B> {
    /// Create a session with the default swap fee.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_swap_policy(backend, SwapPolicy::default())
    }

    /// Create a session that quotes swaps with `swap_policy`.
    #[must_use]
    pub fn with_swap_policy(backend: B, swap_policy: SwapPolicy) -> Self {
        Self {
            backend,
            swap_policy,
            snapshot: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// The wrapped backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Last snapshot, if one has been taken.
    #[must_use]
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Whether a balance-changing call is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fetch balance and discounts and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the previous snapshot is kept.
    pub async fn refresh(&self) -> Result<Snapshot> {
        let balance = self.backend.get_balance().await?;
        let discount = self.backend.get_discount_info().await?;
        let snapshot = Snapshot {
            balance,
            discount,
            refreshed_at: Utc::now(),
        };
        *self.snapshot.write() = Some(snapshot.clone());
        debug!(
            tier = %snapshot.balance.membership.tier,
            total_in_fiat = %snapshot.balance.total_in_fiat,
            "snapshot refreshed"
        );
        Ok(snapshot)
    }

    async fn current(&self) -> Result<Snapshot> {
        if let Some(snapshot) = self.snapshot() {
            return Ok(snapshot);
        }
        self.refresh().await
    }

    async fn refresh_after(&self, operation: &str) {
        if let Err(e) = self.refresh().await {
            warn!(operation, error = %e, "refresh after mutation failed");
            *self.snapshot.write() = None;
        }
    }

    fn ensure_available(&self, currency: Currency, amount: Amount) -> Result<()> {
        if let Some(snapshot) = self.snapshot.read().as_ref() {
            let available = snapshot.balance.balance_of(currency);
            if amount > available {
                return Err(WalletError::insufficient_balance(
                    currency,
                    available.value(),
                    amount.value(),
                ));
            }
        }
        Ok(())
    }

    /// Current balances, from the snapshot when there is one.
    ///
    /// # Errors
    ///
    /// Returns the backend error if a refresh was needed and failed.
    pub async fn balance(&self) -> Result<WalletBalance> {
        Ok(self.current().await?.balance)
    }

    /// Current discounts, from the snapshot when there is one.
    ///
    /// # Errors
    ///
    /// Returns the backend error if a refresh was needed and failed.
    pub async fn discount_info(&self) -> Result<DiscountInfo> {
        Ok(self.current().await?.discount)
    }

    /// Up to `limit` most recent ledger rows.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        let mut rows = self.backend.list_transactions().await?;
        rows.truncate(limit);
        Ok(rows)
    }

    /// Deposit funds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a zero amount, `Busy` while another
    /// mutation is running, or the backend error.
    pub async fn deposit(&self, amount: Amount, currency: Currency) -> Result<Transaction> {
        if amount.is_zero() {
            return Err(WalletError::invalid_amount("deposit amount must be greater than zero"));
        }
        let _guard = InFlight::acquire(&self.in_flight, "deposit")?;
        let tx = self.backend.deposit(amount, currency).await?;
        self.refresh_after("deposit").await;
        Ok(tx)
    }

    /// Withdraw funds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` or `Validation` for a malformed request,
    /// `InsufficientBalance` if the snapshot shows too little, `Busy` while
    /// another mutation is running, or the backend error.
    pub async fn withdraw(&self, request: &WithdrawalRequest) -> Result<Transaction> {
        request.validate()?;
        self.ensure_available(request.currency, request.amount)?;
        let _guard = InFlight::acquire(&self.in_flight, "withdraw")?;
        let tx = self.backend.withdraw(request).await?;
        self.refresh_after("withdraw").await;
        Ok(tx)
    }

    /// Swap currencies.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrencyPair` or `InvalidAmount` for a malformed
    /// request, `InsufficientBalance` if the snapshot shows too little,
    /// `Busy` while another mutation is running, or the backend error.
    pub async fn swap(&self, request: &SwapRequest) -> Result<SwapResult> {
        request.validate()?;
        self.ensure_available(request.from_currency, request.amount)?;
        let _guard = InFlight::acquire(&self.in_flight, "swap")?;
        let result = self.backend.swap(request).await?;
        self.refresh_after("swap").await;
        Ok(result)
    }

    /// Price a swap at the snapshot's rates without executing it.
    ///
    /// # Errors
    ///
    /// Returns the quoting error, or the backend error if a refresh was
    /// needed and failed.
    pub async fn quote_swap(&self, request: &SwapRequest) -> Result<SwapQuote> {
        request.validate()?;
        let snapshot = self.current().await?;
        quote(request, &snapshot.balance.exchange_rates, self.swap_policy.fee_rate)
    }

    /// What `price` costs when paid in `currency` at the current discount.
    ///
    /// # Errors
    ///
    /// Returns the backend error if a refresh was needed and failed.
    pub async fn price_with_discount(&self, price: Amount, currency: Currency) -> Result<DiscountedPrice> {
        let snapshot = self.current().await?;
        apply_discount(price, snapshot.discount.discounts.get(currency), currency)
    }
}
