//! Display classification of ledger rows.

use crate::transaction::{SwapLeg, Transaction, TransactionType};
use rust_decimal::Decimal;
use serde::Serialize;

/// Success color.
pub const COLOR_SUCCESS: &str = "#22C55E";
/// Error color.
pub const COLOR_ERROR: &str = "#EF4444";
/// Accent color.
pub const COLOR_ACCENT: &str = "#F59E0B";

/// Whether a row adds to or takes from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Adds to the balance.
    Credit,
    /// Takes from the balance.
    Debit,
}

impl Direction {
    /// `+` or `-`.
    #[must_use]
    pub const fn sign(&self) -> char {
        match self {
            Self::Credit => '+',
            Self::Debit => '-',
        }
    }
}

/// Color family of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Money in.
    Success,
    /// Money out.
    Error,
    /// Conversion.
    Accent,
}

impl Tone {
    /// Hex color.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Success => COLOR_SUCCESS,
            Self::Error => COLOR_ERROR,
            Self::Accent => COLOR_ACCENT,
        }
    }
}

/// How a row should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Credit or debit.
    pub direction: Direction,
    /// Color family.
    pub tone: Tone,
    /// Icon name.
    pub icon: &'static str,
}

/// Icon for a transaction type.
#[must_use]
pub const fn icon(tx_type: TransactionType) -> &'static str {
    match tx_type {
        TransactionType::Deposit => "arrow-down-circle",
        TransactionType::Withdrawal => "arrow-up-circle",
        TransactionType::Purchase => "cart",
        TransactionType::Sale => "cash",
        TransactionType::Refund => "refresh-circle",
        TransactionType::Swap => "swap-horizontal",
    }
}

/// Classify a ledger row.
///
/// Swap rows are signed by their leg; a swap row without a leg is treated as
/// the source side.
#[must_use]
pub fn classify(tx: &Transaction) -> Classification {
    let (direction, tone) = match tx.tx_type {
        TransactionType::Deposit | TransactionType::Sale | TransactionType::Refund => {
            (Direction::Credit, Tone::Success)
        }
        TransactionType::Withdrawal | TransactionType::Purchase => (Direction::Debit, Tone::Error),
        TransactionType::Swap => match tx.leg {
            Some(SwapLeg::Destination) => (Direction::Credit, Tone::Accent),
            Some(SwapLeg::Source) | None => (Direction::Debit, Tone::Accent),
        },
    };
    Classification {
        direction,
        tone,
        icon: icon(tx.tx_type),
    }
}

/// Signed amount that moved (negative for debits).
#[must_use]
pub fn signed_amount(tx: &Transaction) -> Decimal {
    let moved = tx.net_amount().value();
    match classify(tx).direction {
        Direction::Credit => moved,
        Direction::Debit => -moved,
    }
}
