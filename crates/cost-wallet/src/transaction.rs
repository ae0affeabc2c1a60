//! Wallet ledger records.

use crate::amount::Amount;
use crate::currency::Currency;
use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create a new random transaction ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier shared by the two legs of a swap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapId(String);

impl SwapId {
    /// Create a new random swap ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("swap-{}", Uuid::new_v4()))
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SwapId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Accepted but not yet settled (e.g. a bank payout).
    Pending,
    /// Settled.
    Completed,
    /// Rejected or reversed.
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Type of transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Funds added from outside.
    Deposit,
    /// Funds sent out.
    Withdrawal,
    /// Payment for an order or booking.
    Purchase,
    /// Proceeds of a completed order.
    Sale,
    /// Money returned after a cancellation.
    Refund,
    /// One leg of a currency conversion.
    Swap,
}

impl TransactionType {
    /// Prefix of the human-readable reference.
    #[must_use]
    pub const fn reference_prefix(&self) -> &'static str {
        match self {
            Self::Deposit => "DEP",
            Self::Withdrawal => "WTH",
            Self::Purchase => "ORD",
            Self::Sale => "SAL",
            Self::Refund => "REF",
            Self::Swap => "SWP",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Withdrawal => write!(f, "withdrawal"),
            Self::Purchase => write!(f, "purchase"),
            Self::Sale => write!(f, "sale"),
            Self::Refund => write!(f, "refund"),
            Self::Swap => write!(f, "swap"),
        }
    }
}

/// Which side of a swap a ledger row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapLeg {
    /// Amount debited from the source currency.
    Source,
    /// Amount credited to the destination currency.
    Destination,
}

/// Generate a reference like `DEP-1A2B3C4D`.
#[must_use]
pub fn new_reference(tx_type: TransactionType) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", tx_type.reference_prefix(), hex[..8].to_ascii_uppercase())
}

/// A wallet ledger record.
///
/// Deserialization goes through the same discount check as
/// [`Transaction::purchase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord")]
pub struct Transaction {
    /// Unique transaction ID.
    pub id: TransactionId,

    /// Amount of the row. For discounted purchases this is the list price.
    pub amount: Amount,

    /// Currency of `amount`.
    pub currency: Currency,

    /// Transaction type.
    #[serde(rename = "transaction_type")]
    pub tx_type: TransactionType,

    /// Human-readable description.
    pub description: String,

    /// Settlement status.
    pub status: TransactionStatus,

    /// Human-readable reference.
    #[serde(default)]
    pub reference: Option<String>,

    /// Discount taken off `amount` (never more than `amount`).
    #[serde(default)]
    pub discount_applied: Option<Amount>,

    /// Swap this row belongs to.
    #[serde(default)]
    pub swap_id: Option<SwapId>,

    /// Swap side this row records.
    #[serde(default)]
    pub leg: Option<SwapLeg>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Wire form of [`Transaction`], checked on conversion.
#[derive(Deserialize)]
struct TransactionRecord {
    id: TransactionId,
    amount: Amount,
    currency: Currency,
    #[serde(rename = "transaction_type")]
    tx_type: TransactionType,
    description: String,
    status: TransactionStatus,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    discount_applied: Option<Amount>,
    #[serde(default)]
    swap_id: Option<SwapId>,
    #[serde(default)]
    leg: Option<SwapLeg>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = WalletError;

    fn try_from(record: TransactionRecord) -> Result<Self> {
        ensure_discount_within(record.discount_applied, record.amount)?;
        Ok(Self {
            id: record.id,
            amount: record.amount,
            currency: record.currency,
            tx_type: record.tx_type,
            description: record.description,
            status: record.status,
            reference: record.reference,
            discount_applied: record.discount_applied,
            swap_id: record.swap_id,
            leg: record.leg,
            created_at: record.created_at,
        })
    }
}

fn ensure_discount_within(discount_applied: Option<Amount>, amount: Amount) -> Result<()> {
    if let Some(discount) = discount_applied {
        if discount > amount {
            return Err(WalletError::invalid_amount(format!(
                "discount {discount} exceeds amount {amount}"
            )));
        }
    }
    Ok(())
}

impl Transaction {
    fn base(tx_type: TransactionType, amount: Amount, currency: Currency, description: String) -> Self {
        Self {
            id: TransactionId::new(),
            amount,
            currency,
            tx_type,
            description,
            status: TransactionStatus::Completed,
            reference: Some(new_reference(tx_type)),
            discount_applied: None,
            swap_id: None,
            leg: None,
            created_at: Utc::now(),
        }
    }

    /// A completed deposit.
    #[must_use]
    pub fn deposit(amount: Amount, currency: Currency, description: impl Into<String>) -> Self {
        Self::base(TransactionType::Deposit, amount, currency, description.into())
    }

    /// A withdrawal; pending until the payout settles.
    #[must_use]
    pub fn withdrawal(amount: Amount, currency: Currency, description: impl Into<String>) -> Self {
        let mut tx = Self::base(TransactionType::Withdrawal, amount, currency, description.into());
        tx.status = TransactionStatus::Pending;
        tx
    }

    /// A purchase with the discount that was taken off.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the discount exceeds the amount.
    pub fn purchase(
        amount: Amount,
        currency: Currency,
        description: impl Into<String>,
        discount_applied: Option<Amount>,
    ) -> Result<Self> {
        ensure_discount_within(discount_applied, amount)?;
        let mut tx = Self::base(TransactionType::Purchase, amount, currency, description.into());
        tx.discount_applied = discount_applied.filter(|d| !d.is_zero());
        Ok(tx)
    }

    /// Amount that actually moved: `amount` less any discount.
    #[must_use]
    pub fn net_amount(&self) -> Amount {
        self.amount
            .saturating_sub(self.discount_applied.unwrap_or(Amount::ZERO))
    }

    /// Sale proceeds.
    #[must_use]
    pub fn sale(amount: Amount, currency: Currency, description: impl Into<String>) -> Self {
        Self::base(TransactionType::Sale, amount, currency, description.into())
    }

    /// A refund.
    #[must_use]
    pub fn refund(amount: Amount, currency: Currency, description: impl Into<String>) -> Self {
        Self::base(TransactionType::Refund, amount, currency, description.into())
    }

    /// One leg of a swap. Both legs share `swap_id` and `reference`.
    #[must_use]
    pub fn swap_leg(
        swap_id: &SwapId,
        reference: &str,
        leg: SwapLeg,
        amount: Amount,
        currency: Currency,
        description: impl Into<String>,
    ) -> Self {
        let mut tx = Self::base(TransactionType::Swap, amount, currency, description.into());
        tx.swap_id = Some(swap_id.clone());
        tx.leg = Some(leg);
        tx.reference = Some(reference.to_string());
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_unique() {
        assert_ne!(TransactionId::new(), TransactionId::new());
    }

    #[test]
    fn test_reference_format() {
        let reference = new_reference(TransactionType::Deposit);
        assert!(reference.starts_with("DEP-"));
        assert_eq!(reference.len(), 12);
        assert!(reference[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_deposit_completed() {
        let tx = Transaction::deposit(Amount::from_units(100), Currency::Fiat, "Wallet deposit");
        assert_eq!(tx.tx_type, TransactionType::Deposit);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert!(tx.swap_id.is_none());
    }

    #[test]
    fn test_withdrawal_pending() {
        let tx = Transaction::withdrawal(Amount::from_units(5), Currency::Sol, "Withdrawal");
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.reference.as_deref().is_some_and(|r| r.starts_with("WTH-")));
    }

    #[test]
    fn test_purchase_discount_bounded() {
        let result = Transaction::purchase(
            Amount::from_units(10),
            Currency::Fiat,
            "Purchase",
            Some(Amount::from_units(11)),
        );
        assert!(matches!(result, Err(WalletError::InvalidAmount { .. })));
    }

    #[test]
    fn test_deserialize_checks_discount() {
        let tx = Transaction::purchase(
            Amount::from_units(100),
            Currency::Fiat,
            "Purchase",
            Some(Amount::from_units(30)),
        )
        .expect("valid purchase");
        let mut json = serde_json::to_value(&tx).expect("serialize");
        let parsed: Transaction = serde_json::from_value(json.clone()).expect("deserialize");
        assert_eq!(parsed, tx);

        json["discount_applied"] = serde_json::json!("101");
        assert!(serde_json::from_value::<Transaction>(json).is_err());
    }

    #[test]
    fn test_purchase_zero_discount_dropped() {
        let tx = Transaction::purchase(Amount::from_units(10), Currency::Fiat, "Purchase", Some(Amount::ZERO))
            .expect("valid purchase");
        assert!(tx.discount_applied.is_none());
    }

    #[test]
    fn test_net_amount() {
        let tx = Transaction::purchase(
            Amount::from_units(100),
            Currency::Fiat,
            "Purchase",
            Some(Amount::from_units(30)),
        )
        .expect("valid purchase");
        assert_eq!(tx.net_amount(), Amount::from_units(70));
        assert_eq!(Transaction::sale(Amount::from_units(5), Currency::Fiat, "Sale").net_amount(), Amount::from_units(5));
    }

    #[test]
    fn test_swap_legs_share_ids() {
        let swap_id = SwapId::new();
        let reference = new_reference(TransactionType::Swap);
        let out = Transaction::swap_leg(&swap_id, &reference, SwapLeg::Source, Amount::from_units(1), Currency::Fiat, "out");
        let inn = Transaction::swap_leg(&swap_id, &reference, SwapLeg::Destination, Amount::from_units(20), Currency::Cost, "in");
        assert_eq!(out.swap_id, inn.swap_id);
        assert_eq!(out.reference, inn.reference);
        assert_ne!(out.id, inn.id);
    }

    #[test]
    fn test_wire_names() {
        let tx = Transaction::refund(Amount::from_units(3), Currency::Usdt, "Refund");
        let json = serde_json::to_value(&tx).expect("serialize");
        assert_eq!(json["transaction_type"], "refund");
        assert_eq!(json["currency"], "USDT");
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn test_deserialize_minimal_backend_row() {
        let json = r#"{
            "id": "abc",
            "amount": 2500.0,
            "currency": "FIAT",
            "transaction_type": "purchase",
            "description": "Purchase: Desk lamp",
            "status": "completed",
            "created_at": "2024-05-01T10:00:00Z"
        }"#;
        let tx: Transaction = serde_json::from_str(json).expect("deserialize");
        assert_eq!(tx.tx_type, TransactionType::Purchase);
        assert!(tx.discount_applied.is_none());
        assert!(tx.leg.is_none());
    }
}
