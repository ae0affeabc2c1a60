//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Utc};
use cost_wallet::{
    classify, signed_amount, DiscountInfo, Direction, SwapQuote, SwapResult, TierListing, Tone,
    Transaction, TransactionStatus, WalletBalance,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

impl TableDisplay for WalletBalance {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let symbol = &self.currency.symbol;
        writeln!(writer, "Wallet Balance")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Total:            {symbol}{}", self.total_in_fiat)?;
        writeln!(writer)?;
        writeln!(writer, "Holdings")?;
        writeln!(writer, "  {:<16}{symbol}{}", self.currency.code, self.fiat_balance)?;
        writeln!(writer, "  {:<16}{}", "SOL", self.sol_balance)?;
        writeln!(writer, "  {:<16}{}", "USDT", self.usdt_balance)?;
        writeln!(writer, "  {:<16}{}", "COST", self.cost_balance)?;
        writeln!(writer)?;
        writeln!(writer, "Membership")?;
        writeln!(writer, "  Tier:           {}", self.membership.tier_name)?;
        writeln!(writer, "  Discount:       {}%", self.membership.discount)?;
        match &self.membership.next_tier {
            Some(next) => {
                writeln!(
                    writer,
                    "  Next:           {} ({} COST to go, {}% there)",
                    next.tier_name,
                    next.tokens_needed,
                    self.membership.progress_percent().round_dp(0)
                )?;
            }
            None => writeln!(writer, "  Next:           top tier reached")?,
        }
        writeln!(writer, "  Loyalty points: {}", self.loyalty_points)?;
        Ok(())
    }
}

impl TableDisplay for DiscountInfo {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message)?;
        writeln!(writer)?;
        writeln!(writer, "{:<8}  {:>8}", "CURRENCY", "DISCOUNT")?;
        writeln!(writer, "{}", "─".repeat(18))?;
        for (code, rate) in [
            ("FIAT", self.discounts.fiat),
            ("SOL", self.discounts.sol),
            ("USDT", self.discounts.usdt),
            ("COST", self.discounts.cost),
        ] {
            writeln!(writer, "{code:<8}  {:>7}%", rate.normalize())?;
        }
        writeln!(writer)?;
        writeln!(writer, "Account age: {} day(s)", self.account_age_days)?;
        Ok(())
    }
}

impl TableDisplay for Transaction {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let status = match self.status {
            TransactionStatus::Pending => "⧗",
            TransactionStatus::Completed => "✓",
            TransactionStatus::Failed => "✗",
        };
        writeln!(writer, "{status} {}", self.description)?;
        writeln!(writer, "  Amount:    {} {}", self.net_amount(), self.currency)?;
        writeln!(writer, "  Status:    {}", self.status)?;
        if let Some(reference) = &self.reference {
            writeln!(writer, "  Reference: {reference}")?;
        }
        Ok(())
    }
}

impl TableDisplay for SwapQuote {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Swap Quote")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "You send:     {} {}", self.amount_sent, self.from_currency)?;
        writeln!(
            writer,
            "Rate:         1 {} = {} {}",
            self.from_currency,
            self.rate.normalize(),
            self.to_currency
        )?;
        writeln!(
            writer,
            "Fee ({}%):     {} {}",
            (self.fee_rate * Decimal::ONE_HUNDRED).normalize(),
            self.fee_amount,
            self.to_currency
        )?;
        writeln!(writer, "You receive:  {} {}", self.amount_received, self.to_currency)?;
        Ok(())
    }
}

impl TableDisplay for SwapResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "✓ Swapped {} {} for {} {}",
            self.amount_sent, self.from_currency, self.amount_received, self.to_currency
        )?;
        if let Some(fee) = self.fee_amount {
            writeln!(writer, "  Fee:       {fee} {}", self.to_currency)?;
        }
        if let Some(reference) = self.legs.first().and_then(|leg| leg.reference.as_ref()) {
            writeln!(writer, "  Reference: {reference}")?;
        }
        Ok(())
    }
}

/// One ledger row with its display classification.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    /// Row id.
    pub id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Type label.
    pub transaction_type: String,
    /// Description.
    pub description: String,
    /// Balance effect; negative for debits.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Status label.
    pub status: String,
    /// Credit or debit.
    pub direction: Direction,
    /// Color family.
    pub tone: Tone,
    /// Icon name.
    pub icon: &'static str,
    /// Reference, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        let classification = classify(tx);
        Self {
            id: tx.id.to_string(),
            created_at: tx.created_at,
            transaction_type: tx.tx_type.to_string(),
            description: tx.description.clone(),
            amount: signed_amount(tx),
            currency: tx.currency.to_string(),
            status: tx.status.to_string(),
            direction: classification.direction,
            tone: classification.tone,
            icon: classification.icon,
            reference: tx.reference.clone(),
        }
    }
}

/// Recent transactions for display.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionList {
    /// Rows, newest first.
    pub transactions: Vec<TransactionRow>,
}

impl TransactionList {
    /// Classify `transactions` for display.
    #[must_use]
    pub fn new(transactions: &[Transaction]) -> Self {
        Self {
            transactions: transactions.iter().map(TransactionRow::from).collect(),
        }
    }
}

impl TableDisplay for TransactionList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.transactions.is_empty() {
            writeln!(writer, "No transactions yet")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<16}  {:<10}  {:<32}  {:>18}  {:<4}  {:<9}",
            "DATE", "TYPE", "DESCRIPTION", "AMOUNT", "CUR", "STATUS"
        )?;
        writeln!(writer, "{}", "─".repeat(98))?;

        for row in &self.transactions {
            let amount = if row.amount.is_sign_negative() {
                row.amount.to_string()
            } else {
                format!("+{}", row.amount)
            };
            writeln!(
                writer,
                "{:<16}  {:<10}  {:<32}  {:>18}  {:<4}  {:<9}",
                row.created_at.format("%Y-%m-%d %H:%M"),
                row.transaction_type,
                truncate(&row.description, 32),
                amount,
                row.currency,
                row.status
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Showing {} transaction(s)", self.transactions.len())?;
        Ok(())
    }
}

/// Membership tiers for display.
#[derive(Debug, Clone, Serialize)]
pub struct TierList {
    /// Tiers, lowest first.
    pub tiers: Vec<TierListing>,
}

impl TableDisplay for TierList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "{:<10}  {:>12}  {:>12}  {:>8}",
            "TIER", "MIN COST", "MAX COST", "DISCOUNT"
        )?;
        writeln!(writer, "{}", "─".repeat(48))?;
        for tier in &self.tiers {
            let max = tier
                .max_balance
                .map_or_else(|| "-".to_string(), |max| max.to_string());
            writeln!(
                writer,
                "{:<10}  {:>12}  {:>12}  {:>7}%",
                tier.name,
                tier.min_balance.to_string(),
                max,
                tier.discount.normalize()
            )?;
        }
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
