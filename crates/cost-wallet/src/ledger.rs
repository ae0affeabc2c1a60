//! In-process wallet authority.
//!
//! `LocalLedger` keeps one account in memory and applies every operation
//! under a single lock: an operation either commits all of its balance
//! changes and ledger rows or none of them.

use crate::amount::Amount;
use crate::backend::WalletBackend;
use crate::balance::{Holdings, WalletBalance};
use crate::currency::{Currency, LocalCurrency};
use crate::discount::{account_age_days, apply_discount, DiscountInfo, DiscountPolicy};
use crate::error::{Result, WalletError};
use crate::rates::ExchangeRates;
use crate::swap::{quote, SwapPolicy, SwapRequest, SwapResult};
use crate::tier::TierTable;
use crate::transaction::{new_reference, SwapId, SwapLeg, Transaction, TransactionType};
use crate::withdraw::{WithdrawalDestination, WithdrawalRequest};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Fiat spent per loyalty point earned.
pub const FIAT_PER_LOYALTY_POINT: u64 = 100;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Rules the ledger applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// What `FIAT` stands for.
    pub currency: LocalCurrency,
    /// Initial exchange rates.
    pub rates: ExchangeRates,
    /// Membership tiers.
    pub tiers: TierTable,
    /// Discount policy.
    pub discount: DiscountPolicy,
    /// Swap fee.
    pub swap: SwapPolicy,
    /// COST credited when an account is opened.
    pub welcome_bonus: Amount,
    /// COST credited per redeemed loyalty point.
    pub point_value: Amount,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            currency: LocalCurrency::default(),
            rates: ExchangeRates::default(),
            tiers: TierTable::default(),
            discount: DiscountPolicy::default(),
            swap: SwapPolicy::default(),
            welcome_bonus: Amount::from_units(10),
            point_value: Amount::from_units(1),
        }
    }
}

#[derive(Debug)]
struct LedgerState {
    holder_name: String,
    holdings: Holdings,
    loyalty_points: u64,
    first_deposit_at: Option<DateTime<Utc>>,
    rates: ExchangeRates,
    transactions: Vec<Transaction>,
}

impl LedgerState {
    fn record(&mut self, mut tx: Transaction, now: DateTime<Utc>) -> Transaction {
        tx.created_at = now;
        self.transactions.push(tx.clone());
        tx
    }
}

/// In-memory wallet authority for one account.
#[derive(Clone)]
pub struct LocalLedger {
    settings: Arc<LedgerSettings>,
    state: Arc<Mutex<LedgerState>>,
    clock: Clock,
}

impl fmt::Debug for LocalLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalLedger")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl LocalLedger {
    /// Open an account for `holder_name` and credit the welcome bonus.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the holder name is blank.
    pub fn open_account(holder_name: impl Into<String>, settings: LedgerSettings) -> Result<Self> {
        Self::open_account_with_clock(holder_name, settings, Arc::new(Utc::now))
    }

    /// Open an account using `clock` for timestamps and account age.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the holder name is blank.
    pub fn open_account_with_clock(
        holder_name: impl Into<String>,
        settings: LedgerSettings,
        clock: Clock,
    ) -> Result<Self> {
        let holder_name = holder_name.into();
        if holder_name.trim().is_empty() {
            return Err(WalletError::validation("holder_name", "is required"));
        }

        let now = clock();
        let mut state = LedgerState {
            holder_name,
            holdings: Holdings::default(),
            loyalty_points: 0,
            first_deposit_at: None,
            rates: settings.rates.clone(),
            transactions: Vec::new(),
        };
        if !settings.welcome_bonus.is_zero() {
            state.holdings.credit(Currency::Cost, settings.welcome_bonus)?;
            state.record(
                Transaction::deposit(settings.welcome_bonus, Currency::Cost, "Welcome bonus"),
                now,
            );
        }

        info!(
            holder = %state.holder_name,
            bonus = %settings.welcome_bonus,
            "account opened"
        );

        Ok(Self {
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(state)),
            clock,
        })
    }

    /// Ledger rules in effect.
    #[must_use]
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn describe(&self, amount: Amount, currency: Currency) -> String {
        match currency {
            Currency::Fiat => format!("{}{amount}", self.settings.currency.symbol),
            other => format!("{amount} {other}"),
        }
    }

    /// Replace the exchange-rate table.
    pub async fn set_rates(&self, rates: ExchangeRates) {
        let mut state = self.state.lock().await;
        state.rates = rates;
        info!("exchange rates updated");
    }

    /// Charge a purchase at the discount the wallet currently earns in
    /// `currency`.
    ///
    /// The recorded amount is the list price; the wallet is debited the
    /// discounted total. The buyer earns one loyalty point per
    /// [`FIAT_PER_LOYALTY_POINT`] of fiat value paid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a zero price and `InsufficientBalance` if
    /// the discounted total is not covered.
    pub async fn record_purchase(
        &self,
        price: Amount,
        currency: Currency,
        item: &str,
    ) -> Result<Transaction> {
        if price.is_zero() {
            return Err(WalletError::invalid_amount("price must be greater than zero"));
        }
        let now = self.now();
        let mut state = self.state.lock().await;

        let membership = self.settings.tiers.resolve(state.holdings.cost);
        let age = account_age_days(state.first_deposit_at, now);
        let rate = self.settings.discount.rate_for(currency, &membership, age);
        let priced = apply_discount(price.round_for(currency), rate, currency)?;

        let mut holdings = state.holdings;
        holdings.debit(currency, priced.total)?;
        let points = loyalty_points_for(&state.rates, priced.total, currency)?;
        let tx = Transaction::purchase(
            priced.original,
            currency,
            format!("Purchase: {item}"),
            Some(priced.discount),
        )?;

        state.holdings = holdings;
        state.loyalty_points = state.loyalty_points.saturating_add(points);
        let tx = state.record(tx, now);

        info!(
            amount = %priced.total,
            currency = %currency,
            discount = %priced.discount,
            points,
            "purchase recorded"
        );
        Ok(tx)
    }

    /// Credit the proceeds of a completed sale.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a zero or overflowing amount.
    pub async fn credit_sale(&self, amount: Amount, currency: Currency, item: &str) -> Result<Transaction> {
        self.credit(Transaction::sale(amount, currency, format!("Sale: {item}")))
            .await
    }

    /// Credit a refund.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a zero or overflowing amount.
    pub async fn refund(&self, amount: Amount, currency: Currency, reason: &str) -> Result<Transaction> {
        self.credit(Transaction::refund(amount, currency, format!("Refund: {reason}")))
            .await
    }

    async fn credit(&self, tx: Transaction) -> Result<Transaction> {
        if tx.amount.is_zero() {
            return Err(WalletError::invalid_amount("amount must be greater than zero"));
        }
        let now = self.now();
        let mut state = self.state.lock().await;
        state.holdings.credit(tx.currency, tx.amount)?;
        let tx = state.record(tx, now);

        info!(
            kind = %tx.tx_type,
            amount = %tx.amount,
            currency = %tx.currency,
            "credit recorded"
        );
        Ok(tx)
    }

    /// Convert loyalty points into COST at the configured point value.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `points` is zero or more than the wallet holds.
    pub async fn redeem_points(&self, points: u64) -> Result<Transaction> {
        if points == 0 {
            return Err(WalletError::validation("points", "must be greater than zero"));
        }
        let now = self.now();
        let mut state = self.state.lock().await;
        if points > state.loyalty_points {
            return Err(WalletError::validation(
                "points",
                format!("only {} points available", state.loyalty_points),
            ));
        }

        let reward = self
            .settings
            .point_value
            .checked_mul(Decimal::from(points))
            .ok_or_else(|| WalletError::invalid_amount("reward out of range"))?;
        let mut holdings = state.holdings;
        holdings.credit(Currency::Cost, reward)?;

        state.holdings = holdings;
        state.loyalty_points -= points;
        let tx = state.record(
            Transaction::deposit(reward, Currency::Cost, format!("Loyalty reward: {points} points")),
            now,
        );

        info!(points, reward = %reward, "loyalty points redeemed");
        Ok(tx)
    }
}

/// Loyalty points earned for paying `amount` of `currency`.
///
/// # Errors
///
/// Returns error if the currency has no rate.
pub fn loyalty_points_for(rates: &ExchangeRates, amount: Amount, currency: Currency) -> Result<u64> {
    let fiat = rates.to_fiat(amount, currency)?;
    Ok((fiat / Decimal::from(FIAT_PER_LOYALTY_POINT))
        .floor()
        .to_u64()
        .unwrap_or(u64::MAX))
}

/// Whether the name on a bank account plausibly belongs to the holder:
/// at least one name part in common, ignoring case.
#[must_use]
pub fn names_match(holder_name: &str, account_name: &str) -> bool {
    let account_parts: Vec<String> = account_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    holder_name
        .split_whitespace()
        .map(str::to_lowercase)
        .any(|part| account_parts.contains(&part))
}

impl WalletBackend for LocalLedger {
    async fn get_balance(&self) -> Result<WalletBalance> {
        let state = self.state.lock().await;
        debug!(holder = %state.holder_name, "balance read");
        WalletBalance::from_holdings(
            &state.holdings,
            state.loyalty_points,
            self.settings.currency.clone(),
            state.rates.clone(),
            &self.settings.tiers,
            state.first_deposit_at,
        )
    }

    async fn get_discount_info(&self) -> Result<DiscountInfo> {
        let now = self.now();
        let state = self.state.lock().await;
        let membership = self.settings.tiers.resolve(state.holdings.cost);
        let age = account_age_days(state.first_deposit_at, now);
        Ok(self.settings.discount.info(membership, age))
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let state = self.state.lock().await;
        Ok(state.transactions.iter().rev().cloned().collect())
    }

    async fn deposit(&self, amount: Amount, currency: Currency) -> Result<Transaction> {
        if amount.is_zero() {
            return Err(WalletError::invalid_amount("deposit amount must be greater than zero"));
        }
        let now = self.now();
        let description = format!("Wallet deposit of {}", self.describe(amount, currency));
        let mut state = self.state.lock().await;

        state.holdings.credit(currency, amount)?;
        state.first_deposit_at.get_or_insert(now);
        let tx = state.record(Transaction::deposit(amount, currency, description), now);

        info!(
            amount = %amount,
            currency = %currency,
            reference = tx.reference.as_deref().unwrap_or_default(),
            "deposit completed"
        );
        Ok(tx)
    }

    async fn withdraw(&self, request: &WithdrawalRequest) -> Result<Transaction> {
        request.validate()?;
        let now = self.now();
        let mut state = self.state.lock().await;

        let mut holdings = state.holdings;
        holdings.debit(request.currency, request.amount)?;
        if let WithdrawalDestination::Bank { account_name, .. } = &request.destination {
            if !names_match(&state.holder_name, account_name) {
                return Err(WalletError::validation(
                    "account_name",
                    "bank account name must match your registered name",
                ));
            }
        }

        state.holdings = holdings;
        let tx = state.record(
            Transaction::withdrawal(
                request.amount,
                request.currency,
                format!("Withdrawal to {}", request.destination.label()),
            ),
            now,
        );

        info!(
            amount = %request.amount,
            currency = %request.currency,
            reference = tx.reference.as_deref().unwrap_or_default(),
            "withdrawal submitted"
        );
        Ok(tx)
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapResult> {
        request.validate()?;
        let now = self.now();
        let mut state = self.state.lock().await;

        request.ensure_covered(state.holdings.get(request.from_currency))?;
        let priced = quote(request, &state.rates, self.settings.swap.fee_rate)?;

        let mut holdings = state.holdings;
        holdings.debit(priced.from_currency, priced.amount_sent)?;
        holdings.credit(priced.to_currency, priced.amount_received)?;

        let swap_id = SwapId::new();
        let reference = new_reference(TransactionType::Swap);
        let description = format!(
            "Swap {} to {}",
            self.describe(priced.amount_sent, priced.from_currency),
            self.describe(priced.amount_received, priced.to_currency)
        );
        let source = Transaction::swap_leg(
            &swap_id,
            &reference,
            SwapLeg::Source,
            priced.amount_sent,
            priced.from_currency,
            description.clone(),
        );
        let destination = Transaction::swap_leg(
            &swap_id,
            &reference,
            SwapLeg::Destination,
            priced.amount_received,
            priced.to_currency,
            description,
        );

        state.holdings = holdings;
        let legs = vec![state.record(source, now), state.record(destination, now)];

        info!(
            swap_id = %swap_id,
            from = %priced.from_currency,
            to = %priced.to_currency,
            sent = %priced.amount_sent,
            received = %priced.amount_received,
            fee = %priced.fee_amount,
            "swap completed"
        );
        Ok(SwapResult::settled(swap_id, &priced, legs))
    }
}
