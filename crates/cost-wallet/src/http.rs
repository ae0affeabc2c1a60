//! REST client for the marketplace wallet API.

use crate::amount::Amount;
use crate::backend::WalletBackend;
use crate::balance::{Holdings, WalletBalance};
use crate::currency::{Currency, LocalCurrency};
use crate::discount::DiscountInfo;
use crate::error::{Result, WalletError};
use crate::rates::ExchangeRates;
use crate::storage::{SecretStorage, AUTH_TOKEN_KEY};
use crate::swap::{SwapRequest, SwapResult};
use crate::tier::TierTable;
use crate::transaction::Transaction;
use crate::withdraw::WithdrawalRequest;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wallet authority reached over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    storage: Arc<dyn SecretStorage>,
    currency: LocalCurrency,
    rates: ExchangeRates,
    tiers: TierTable,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct DepositBody {
    amount: Amount,
    currency: Currency,
}

/// Reply to a deposit or withdrawal: either the ledger row itself or the
/// short receipt older servers send.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransactionReply {
    Row(Transaction),
    Receipt {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        reference: Option<String>,
    },
}

/// Balance reply: full snapshot, or only fiat and points from older servers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BalanceReply {
    Full(Box<WalletBalance>),
    Legacy {
        balance: Amount,
        #[serde(default)]
        loyalty_points: u64,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpBackend {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the URL is empty or the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        storage: Arc<dyn SecretStorage>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(WalletError::config("backend url must not be empty"));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            storage,
            currency: LocalCurrency::default(),
            rates: ExchangeRates::default(),
            tiers: TierTable::default(),
        })
    }

    /// Local currency reported for older servers that only send the fiat
    /// balance.
    #[must_use]
    pub fn with_currency(mut self, currency: LocalCurrency) -> Self {
        self.currency = currency;
        self
    }

    /// Rates reported, and used for quotes, when the server sends only the
    /// fiat balance.
    #[must_use]
    pub fn with_rates(mut self, rates: ExchangeRates) -> Self {
        self.rates = rates;
        self
    }

    /// Tier table used to resolve membership for older servers that only
    /// report the fiat balance.
    #[must_use]
    pub fn with_tiers(mut self, tiers: TierTable) -> Self {
        self.tiers = tiers;
        self
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/wallet/{endpoint}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.storage.get(AUTH_TOKEN_KEY)? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self
            .authorize(request)?
            .send()
            .await
            .map_err(|e| WalletError::remote(None, format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| WalletError::remote(Some(status.as_u16()), format!("invalid response: {e}")));
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!("backend rejected credentials, clearing stored token");
            self.storage.delete(AUTH_TOKEN_KEY)?;
        }
        let body = response.text().await.unwrap_or_default();
        Err(WalletError::remote(Some(status.as_u16()), error_message(status, &body)))
    }

    async fn transaction_reply(
        &self,
        request: RequestBuilder,
        fallback: impl FnOnce(Option<String>) -> Transaction,
    ) -> Result<Transaction> {
        match self.send::<TransactionReply>(request).await? {
            TransactionReply::Row(tx) => Ok(tx),
            TransactionReply::Receipt { message, reference } => {
                let mut tx = fallback(message);
                if reference.is_some() {
                    tx.reference = reference;
                }
                Ok(tx)
            }
        }
    }
}

/// Message for a failed response: the backend's `detail` when present.
fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.detail);
    match detail {
        Some(serde_json::Value::String(message)) => message,
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        _ => status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string),
    }
}

impl WalletBackend for HttpBackend {
    async fn get_balance(&self) -> Result<WalletBalance> {
        let reply: BalanceReply = self.send(self.client.get(self.url("balance"))).await?;
        debug!("balance fetched");
        match reply {
            BalanceReply::Full(balance) => Ok(*balance),
            BalanceReply::Legacy {
                balance,
                loyalty_points,
            } => WalletBalance::from_holdings(
                &Holdings {
                    fiat: balance,
                    ..Holdings::default()
                },
                loyalty_points,
                self.currency.clone(),
                self.rates.clone(),
                &self.tiers,
                None,
            ),
        }
    }

    async fn get_discount_info(&self) -> Result<DiscountInfo> {
        self.send(self.client.get(self.url("discount-info"))).await
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.send(self.client.get(self.url("transactions"))).await
    }

    async fn deposit(&self, amount: Amount, currency: Currency) -> Result<Transaction> {
        let request = self
            .client
            .post(self.url("deposit"))
            .json(&DepositBody { amount, currency });
        let tx = self
            .transaction_reply(request, |message| {
                Transaction::deposit(amount, currency, message.unwrap_or_else(|| "Wallet deposit".to_string()))
            })
            .await?;
        info!(amount = %amount, currency = %currency, "deposit submitted");
        Ok(tx)
    }

    async fn withdraw(&self, request: &WithdrawalRequest) -> Result<Transaction> {
        let http = self.client.post(self.url("withdraw")).json(request);
        let tx = self
            .transaction_reply(http, |message| {
                Transaction::withdrawal(
                    request.amount,
                    request.currency,
                    message.unwrap_or_else(|| format!("Withdrawal to {}", request.destination.label())),
                )
            })
            .await?;
        info!(amount = %request.amount, currency = %request.currency, "withdrawal submitted");
        Ok(tx)
    }

    async fn swap(&self, request: &SwapRequest) -> Result<SwapResult> {
        let result: SwapResult = self.send(self.client.post(self.url("swap")).json(request)).await?;
        info!(
            from = %result.from_currency,
            to = %result.to_currency,
            sent = %result.amount_sent,
            received = %result.amount_received,
            "swap submitted"
        );
        Ok(result)
    }
}
