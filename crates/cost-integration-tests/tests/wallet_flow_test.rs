//! End-to-end tests for the wallet flow.
//!
//! Drives a session over the in-process ledger through:
//! 1. Account opening and membership resolution
//! 2. Deposits and swaps
//! 3. Withdrawals and their validation
//! 4. Discounts as the account ages
//! 5. Purchases, loyalty points and refunds
//! 6. Pricing properties

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Duration, TimeZone, Utc};
use cost_wallet::ledger::Clock;
use cost_wallet::{
    Amount, Currency, DiscountPolicy, ExchangeRates, LedgerSettings, LocalLedger, MembershipTier,
    SwapLeg, SwapRequest, TierTable, TransactionStatus, TransactionType, WalletBackend,
    WalletError, WalletSession, WithdrawalDestination, WithdrawalRequest, classify, quote,
    signed_amount, SWAP_FEE_RATE,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Helper Functions
// ============================================================================

fn settings() -> LedgerSettings {
    LedgerSettings {
        welcome_bonus: Amount::ZERO,
        ..LedgerSettings::default()
    }
}

fn session() -> WalletSession<LocalLedger> {
    let ledger = LocalLedger::open_account("Ada Obi", settings()).expect("ledger");
    WalletSession::new(ledger)
}

/// Clock starting at 2024-01-01 that advances only when told to.
fn manual_clock() -> (Clock, Arc<AtomicI64>) {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .expect("valid start");
    let days = Arc::new(AtomicI64::new(0));
    let offset = Arc::clone(&days);
    let clock: Clock = Arc::new(move || start + Duration::days(offset.load(Ordering::SeqCst)));
    (clock, days)
}

fn bank_withdrawal(amount: u64, bank_name: &str) -> WithdrawalRequest {
    WithdrawalRequest::new(
        Amount::from_units(amount),
        Currency::Fiat,
        WithdrawalDestination::bank(bank_name, "0123456789", "Ada Obi"),
    )
}

// ============================================================================
// Phase 1: Account Opening and Membership
// ============================================================================

#[tokio::test]
async fn new_account_receives_welcome_bonus() {
    let ledger = LocalLedger::open_account("Ada Obi", LedgerSettings::default()).expect("ledger");
    let session = WalletSession::new(ledger);

    let balance = session.balance().await.expect("balance");
    assert_eq!(balance.cost_balance, Amount::from_units(10));
    assert!(balance.first_deposit_at.is_none());
    assert_eq!(balance.membership.tier, MembershipTier::Basic);

    let rows = session.recent_transactions(10).await.expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "Welcome bonus");
}

#[test]
fn silver_threshold_points_at_gold() {
    let status = TierTable::default().resolve(Amount::from_units(30_000));
    assert_eq!(status.tier, MembershipTier::Silver);

    let next = status.next_tier.expect("gold is above silver");
    assert_eq!(next.tier, MembershipTier::Gold);
    assert_eq!(next.tokens_needed, Amount::from_units(20_000));
}

#[tokio::test]
async fn membership_follows_cost_balance() {
    let session = session();
    session.deposit(Amount::from_units(49_999), Currency::Cost).await.expect("deposit");
    assert_eq!(session.balance().await.expect("balance").membership.tier, MembershipTier::Silver);

    session.deposit(Amount::from_units(1), Currency::Cost).await.expect("deposit");
    let balance = session.balance().await.expect("balance");
    assert_eq!(balance.membership.tier, MembershipTier::Gold);
    assert_eq!(
        balance.membership.next_tier.map(|n| n.tokens_needed),
        Some(Amount::from_units(50_000))
    );
}

// ============================================================================
// Phase 2: Deposits and Swaps
// ============================================================================

#[tokio::test]
async fn swap_fiat_to_cost_takes_one_percent() {
    let session = session();
    session.deposit(Amount::from_units(100), Currency::Fiat).await.expect("deposit");

    let request = SwapRequest::new(Currency::Fiat, Currency::Cost, Amount::from_units(100)).expect("request");
    let result = session.swap(&request).await.expect("swap");
    assert_eq!(result.amount_received, Amount::from_units(1980));
    assert_eq!(result.fee_amount, Some(Amount::from_units(20)));

    let balance = session.balance().await.expect("balance");
    assert!(balance.fiat_balance.is_zero());
    assert_eq!(balance.cost_balance, Amount::from_units(1980));
}

#[tokio::test]
async fn swap_legs_share_id_and_reference() {
    let session = session();
    session.deposit(Amount::from_units(500), Currency::Fiat).await.expect("deposit");
    let request = SwapRequest::parse("fiat", "usdt", "500").expect("request");
    let result = session.swap(&request).await.expect("swap");

    assert_eq!(result.legs.len(), 2);
    let (source, destination) = (&result.legs[0], &result.legs[1]);
    assert_eq!(source.leg, Some(SwapLeg::Source));
    assert_eq!(destination.leg, Some(SwapLeg::Destination));
    assert_eq!(source.swap_id, result.swap_id);
    assert_eq!(destination.swap_id, result.swap_id);
    assert_eq!(source.reference, destination.reference);

    assert_eq!(signed_amount(source), Decimal::from(-500));
    assert!(signed_amount(destination) > Decimal::ZERO);
    assert_eq!(classify(source).tone, classify(destination).tone);
}

#[tokio::test]
async fn swap_of_nothing_is_invalid_and_moves_nothing() {
    let session = session();
    session.deposit(Amount::from_units(100), Currency::Fiat).await.expect("deposit");

    let zero = SwapRequest::new(Currency::Fiat, Currency::Cost, Amount::ZERO);
    assert!(matches!(zero, Err(WalletError::InvalidAmount { .. })));
    let negative = SwapRequest::parse("FIAT", "COST", "-5");
    assert!(matches!(negative, Err(WalletError::InvalidAmount { .. })));

    let balance = session.balance().await.expect("balance");
    assert_eq!(balance.fiat_balance, Amount::from_units(100));
    assert_eq!(session.recent_transactions(10).await.expect("rows").len(), 1);
}

#[tokio::test]
async fn swap_beyond_balance_is_rejected() {
    let session = session();
    session.deposit(Amount::from_units(50), Currency::Fiat).await.expect("deposit");

    let request = SwapRequest::new(Currency::Fiat, Currency::Sol, Amount::from_units(51)).expect("request");
    let err = session.swap(&request).await.unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance { currency: Currency::Fiat, .. }));

    // The ledger enforces the same rule when no snapshot is cached.
    let err = session.backend().swap(&request).await.unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance { .. }));
    assert_eq!(session.balance().await.expect("balance").fiat_balance, Amount::from_units(50));
}

#[tokio::test]
async fn swap_between_same_currency_is_invalid_pair() {
    let err = SwapRequest::parse("COST", "cost", "10").unwrap_err();
    assert!(matches!(err, WalletError::InvalidCurrencyPair { .. }));

    let session = session();
    session.deposit(Amount::from_units(100), Currency::Fiat).await.expect("deposit");
    let unchecked = SwapRequest {
        from_currency: Currency::Fiat,
        to_currency: Currency::Fiat,
        amount: Amount::from_units(100),
    };

    let err = session.swap(&unchecked).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidCurrencyPair { .. }));
    let err = session.backend().swap(&unchecked).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidCurrencyPair { .. }));

    assert_eq!(session.balance().await.expect("balance").fiat_balance, Amount::from_units(100));
    assert_eq!(session.recent_transactions(10).await.expect("rows").len(), 1);
}

#[tokio::test]
async fn unchecked_zero_swap_is_invalid_amount() {
    let session = session();
    session.deposit(Amount::from_units(100), Currency::Fiat).await.expect("deposit");
    let unchecked = SwapRequest {
        from_currency: Currency::Fiat,
        to_currency: Currency::Cost,
        amount: Amount::ZERO,
    };

    let err = session.swap(&unchecked).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount { .. }));
    let err = session.backend().swap(&unchecked).await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount { .. }));
    assert_eq!(session.recent_transactions(10).await.expect("rows").len(), 1);
}

#[tokio::test]
async fn swap_too_small_to_credit_beyond_balance_is_insufficient() {
    // 0.1 COST is worth less than a fiat cent, and nothing is held.
    let tiny = Amount::from_parts(1, 1).expect("0.1");
    let request = SwapRequest::new(Currency::Cost, Currency::Fiat, tiny).expect("request");

    let ledger = LocalLedger::open_account("Ada Obi", settings()).expect("ledger");
    let err = ledger.swap(&request).await.unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance { currency: Currency::Cost, .. }));

    let session = session();
    let err = session.swap(&request).await.unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance { currency: Currency::Cost, .. }));
    session.balance().await.expect("balance");
    let err = session.swap(&request).await.unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance { currency: Currency::Cost, .. }));
    assert!(session.recent_transactions(10).await.expect("rows").is_empty());
}

#[tokio::test]
async fn quote_matches_executed_swap() {
    let session = session();
    session.deposit(Amount::from_units(2_000), Currency::Fiat).await.expect("deposit");
    let request = SwapRequest::new(Currency::Fiat, Currency::Sol, Amount::from_units(2_000)).expect("request");

    let quoted = session.quote_swap(&request).await.expect("quote");
    let executed = session.swap(&request).await.expect("swap");
    assert_eq!(quoted.amount_received, executed.amount_received);
    assert_eq!(executed.fee_rate, SWAP_FEE_RATE);
}

// ============================================================================
// Phase 3: Withdrawals
// ============================================================================

#[tokio::test]
async fn withdrawal_without_bank_name_records_nothing() {
    let session = session();
    session.deposit(Amount::from_units(100), Currency::Fiat).await.expect("deposit");

    let err = session.withdraw(&bank_withdrawal(40, "")).await.unwrap_err();
    assert!(matches!(err, WalletError::Validation { ref field, .. } if field == "bank_name"));

    assert_eq!(session.recent_transactions(10).await.expect("rows").len(), 1);
    assert_eq!(session.balance().await.expect("balance").fiat_balance, Amount::from_units(100));
}

#[tokio::test]
async fn bank_withdrawal_is_pending_debit() {
    let session = session();
    session.deposit(Amount::from_units(100), Currency::Fiat).await.expect("deposit");

    let tx = session.withdraw(&bank_withdrawal(40, "First Bank")).await.expect("withdraw");
    assert_eq!(tx.tx_type, TransactionType::Withdrawal);
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(signed_amount(&tx), Decimal::from(-40));
    assert_eq!(session.balance().await.expect("balance").fiat_balance, Amount::from_units(60));
}

#[tokio::test]
async fn withdrawal_to_someone_else_is_refused() {
    let session = session();
    session.deposit(Amount::from_units(100), Currency::Fiat).await.expect("deposit");

    let request = WithdrawalRequest::new(
        Amount::from_units(40),
        Currency::Fiat,
        WithdrawalDestination::bank("First Bank", "0123456789", "John Doe"),
    );
    assert!(session.withdraw(&request).await.is_err());
    assert_eq!(session.balance().await.expect("balance").fiat_balance, Amount::from_units(100));
}

#[tokio::test]
async fn crypto_withdrawal_needs_valid_address() {
    let session = session();
    session.deposit(Amount::from_units(5), Currency::Sol).await.expect("deposit");

    let bad = WithdrawalRequest::new(
        Amount::from_units(1),
        Currency::Sol,
        WithdrawalDestination::crypto("not-an-address"),
    );
    assert!(matches!(session.withdraw(&bad).await, Err(WalletError::Validation { .. })));

    let good = WithdrawalRequest::new(
        Amount::from_units(1),
        Currency::Sol,
        WithdrawalDestination::crypto("11111111111111111111111111111111"),
    );
    session.withdraw(&good).await.expect("withdraw");
    assert_eq!(session.balance().await.expect("balance").sol_balance, Amount::from_units(4));
}

#[tokio::test]
async fn withdrawal_beyond_balance_is_rejected() {
    let session = session();
    session.deposit(Amount::from_units(10), Currency::Fiat).await.expect("deposit");
    let err = session.withdraw(&bank_withdrawal(11, "First Bank")).await.unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance { .. }));
}

// ============================================================================
// Phase 4: Discounts Over Time
// ============================================================================

#[tokio::test]
async fn cost_discount_decays_to_floor_after_a_year() {
    let (clock, days) = manual_clock();
    let ledger = LocalLedger::open_account_with_clock("Ada Obi", settings(), clock).expect("ledger");
    let session = WalletSession::new(ledger);
    session.deposit(Amount::from_units(100_000), Currency::Cost).await.expect("deposit");

    let fresh = session.refresh().await.expect("refresh").discount;
    assert_eq!(fresh.membership.tier, MembershipTier::Platinum);
    assert_eq!(fresh.discounts.cost, Decimal::from(50));
    assert_eq!(fresh.discounts.fiat, Decimal::from(5));

    days.store(182, Ordering::SeqCst);
    let midway = session.refresh().await.expect("refresh").discount;
    assert!(midway.discounts.cost < fresh.discounts.cost);
    assert!(midway.discounts.cost > Decimal::from(15));

    days.store(400, Ordering::SeqCst);
    let aged = session.refresh().await.expect("refresh").discount;
    assert_eq!(aged.account_age_days, 400);
    assert_eq!(aged.discounts.cost, Decimal::from(15));
    assert_eq!(aged.discounts.usdt, Decimal::from(5));
}

#[tokio::test]
async fn price_with_discount_uses_current_rate() {
    let session = session();
    session.deposit(Amount::from_units(1_000), Currency::Fiat).await.expect("deposit");

    let priced = session
        .price_with_discount(Amount::from_units(200), Currency::Fiat)
        .await
        .expect("price");
    assert_eq!(priced.discount, Amount::from_units(10));
    assert_eq!(priced.total, Amount::from_units(190));
}

// ============================================================================
// Phase 5: Purchases, Loyalty and Refunds
// ============================================================================

#[tokio::test]
async fn purchase_earns_points_that_redeem_for_cost() {
    let ledger = LocalLedger::open_account("Ada Obi", settings()).expect("ledger");
    let session = WalletSession::new(ledger.clone());
    session.deposit(Amount::from_units(10_000), Currency::Fiat).await.expect("deposit");

    let tx = ledger
        .record_purchase(Amount::from_units(10_000), Currency::Fiat, "Desk lamp")
        .await
        .expect("purchase");
    assert_eq!(tx.amount, Amount::from_units(10_000));
    assert_eq!(tx.discount_applied, Some(Amount::from_units(500)));
    assert_eq!(signed_amount(&tx), Decimal::from(-9_500));

    let balance = session.refresh().await.expect("refresh").balance;
    assert_eq!(balance.fiat_balance, Amount::from_units(500));
    assert_eq!(balance.loyalty_points, 95);

    ledger.redeem_points(95).await.expect("redeem");
    let balance = session.refresh().await.expect("refresh").balance;
    assert_eq!(balance.loyalty_points, 0);
    assert_eq!(balance.cost_balance, Amount::from_units(95));

    assert!(matches!(ledger.redeem_points(1).await, Err(WalletError::Validation { .. })));
}

#[tokio::test]
async fn refunds_and_sales_credit_the_wallet() {
    let ledger = LocalLedger::open_account("Ada Obi", settings()).expect("ledger");
    ledger
        .credit_sale(Amount::from_units(300), Currency::Usdt, "Textbook")
        .await
        .expect("sale");
    ledger
        .refund(Amount::from_units(20), Currency::Usdt, "Damaged item")
        .await
        .expect("refund");

    let balance = ledger.get_balance().await.expect("balance");
    assert_eq!(balance.usdt_balance, Amount::from_units(320));

    let rows = ledger.list_transactions().await.expect("rows");
    assert_eq!(rows[0].tx_type, TransactionType::Refund);
    assert!(rows.iter().all(|tx| signed_amount(tx) > Decimal::ZERO));
}

#[tokio::test]
async fn recent_transactions_are_newest_first_and_limited() {
    let session = session();
    for units in 1..=12 {
        session.deposit(Amount::from_units(units), Currency::Fiat).await.expect("deposit");
    }
    let rows = session.recent_transactions(10).await.expect("rows");
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].amount, Amount::from_units(12));
    assert_eq!(rows[9].amount, Amount::from_units(3));
}

// ============================================================================
// Phase 6: Pricing Properties
// ============================================================================

fn currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

proptest! {
    #[test]
    fn tier_threshold_is_bracketed(units in 0u64..250_000) {
        let balance = Amount::from_units(units);
        let status = TierTable::default().resolve(balance);
        prop_assert!(status.min_balance <= balance);
        if let Some(next) = status.next_tier {
            prop_assert!(balance < next.min_balance);
        } else {
            prop_assert_eq!(status.tier, MembershipTier::Platinum);
        }
    }

    #[test]
    fn cost_discount_never_rises_with_age(cost in 0u64..200_000, age in 0u32..500, later in 0u32..500) {
        let policy = DiscountPolicy::default();
        let status = TierTable::default().resolve(Amount::from_units(cost));
        let earlier = policy.cost_rate(status.discount, age);
        let after = policy.cost_rate(status.discount, age.saturating_add(later));
        prop_assert!(after <= earlier);
    }

    #[test]
    fn aged_accounts_get_the_floor(cost in 0u64..200_000, age in 365u32..5_000) {
        let policy = DiscountPolicy::default();
        let status = TierTable::default().resolve(Amount::from_units(cost));
        prop_assert_eq!(policy.cost_rate(status.discount, age), policy.floor_rate);
    }

    #[test]
    fn swapping_back_never_gains(
        from in currency(),
        to in currency(),
        units in 1u64..1_000_000,
    ) {
        prop_assume!(from != to);
        let rates = ExchangeRates::default();
        let sent = Amount::from_units(units);
        let Ok(request) = SwapRequest::new(from, to, sent) else {
            return Ok(());
        };
        let Ok(there) = quote(&request, &rates, SWAP_FEE_RATE) else {
            return Ok(());
        };
        let Ok(back_request) = SwapRequest::new(to, from, there.amount_received) else {
            return Ok(());
        };
        if let Ok(back) = quote(&back_request, &rates, SWAP_FEE_RATE) {
            prop_assert!(back.amount_received <= sent);
        }
    }
}
