//! Ledger JSON-RPC client.
//!
//! Talks to XRPL JSON-RPC endpoints over HTTP. Balance lookups walk an
//! ordered endpoint list and take the first answer; only exhausting
//! the whole list is an error, and that error carries how many
//! endpoints were tried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::ledger::address::validate_address;
use crate::ledger::amount::{drops_to_xrp, format_xrp};
use crate::ledger::payment::{decode_memo, ObservedPayment};

/// An account balance as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account address.
    pub address: String,
    /// Balance in drops.
    pub drops: u64,
}

impl AccountBalance {
    /// Balance in XRP.
    #[must_use]
    pub fn xrp(&self) -> f64 {
        drops_to_xrp(self.drops)
    }

    /// Two-decimal display string, e.g. "12.50 XRP".
    #[must_use]
    pub fn display(&self) -> String {
        format_xrp(self.drops)
    }
}

/// Read access to ledger transactions.
///
/// The attestation pipeline polls through this seam, so tests can
/// stand in a scripted ledger.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Look up a transaction by hash.
    async fn transaction(&self, tx_hash: &str) -> Result<ObservedPayment>;
}

/// JSON-RPC client for the settlement ledger.
pub struct XrplRpcClient {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl XrplRpcClient {
    /// Create a client over the configured endpoint list.
    #[must_use]
    pub fn new(config: &LedgerConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lodgewire/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.query_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoints: config.endpoints.clone(),
        }
    }

    /// Look up an account balance, falling through the endpoint list.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a malformed address before any
    /// network call, and `Error::BalanceLookup` once every endpoint
    /// has failed.
    pub async fn account_balance(&self, address: &str) -> Result<AccountBalance> {
        validate_address(address)?;

        for endpoint in &self.endpoints {
            match self.account_info(endpoint, address).await {
                Ok(drops) => {
                    debug!(%endpoint, %address, drops, "balance served");
                    return Ok(AccountBalance {
                        address: address.to_string(),
                        drops,
                    });
                }
                Err(e) => {
                    warn!(%endpoint, error = %e, "balance endpoint failed, trying next");
                }
            }
        }

        Err(Error::BalanceLookup {
            attempted: self.endpoints.len(),
        })
    }

    async fn account_info(&self, endpoint: &str, address: &str) -> Result<u64> {
        let body = json!({
            "method": "account_info",
            "params": [{
                "account": address,
                "strict": true,
                "ledger_index": "current",
                "queue": true
            }]
        });
        let response = self
            .client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Ledger(format!("account_info request failed: {e}")))?;
        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::Ledger(format!("account_info response unreadable: {e}")))?;
        parse_account_info(&data)
    }

    /// Look up a transaction by hash, falling through the endpoint
    /// list.
    ///
    /// # Errors
    ///
    /// Returns `Error::Ledger` when no endpoint can serve the lookup.
    pub async fn tx(&self, tx_hash: &str) -> Result<ObservedPayment> {
        let body = json!({
            "method": "tx",
            "params": [{
                "transaction": tx_hash
            }]
        });

        let mut last_error = None;
        for endpoint in &self.endpoints {
            let outcome = async {
                let response = self
                    .client
                    .post(endpoint)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| Error::Ledger(format!("tx request failed: {e}")))?;
                let data: Value = response
                    .json()
                    .await
                    .map_err(|e| Error::Ledger(format!("tx response unreadable: {e}")))?;
                parse_tx(&data)
            }
            .await;
            match outcome {
                Ok(payment) => return Ok(payment),
                Err(e) => {
                    warn!(%endpoint, error = %e, "tx endpoint failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Ledger("no ledger endpoints configured".to_string())))
    }
}

#[async_trait]
impl LedgerQuery for XrplRpcClient {
    async fn transaction(&self, tx_hash: &str) -> Result<ObservedPayment> {
        self.tx(tx_hash).await
    }
}

/// Extract the drop balance from an `account_info` response.
fn parse_account_info(data: &Value) -> Result<u64> {
    let result = data
        .get("result")
        .ok_or_else(|| Error::Ledger("account_info response missing result".to_string()))?;
    if let Some(error) = result.get("error").and_then(Value::as_str) {
        return Err(Error::Ledger(format!("ledger reported: {error}")));
    }
    result
        .pointer("/account_data/Balance")
        .and_then(Value::as_str)
        .and_then(|balance| balance.parse().ok())
        .ok_or_else(|| Error::Ledger("account_info response missing balance".to_string()))
}

/// Extract an observed payment from a `tx` response.
fn parse_tx(data: &Value) -> Result<ObservedPayment> {
    let result = data
        .get("result")
        .ok_or_else(|| Error::Ledger("tx response missing result".to_string()))?;
    if let Some(error) = result.get("error").and_then(Value::as_str) {
        return Err(Error::Ledger(format!("ledger reported: {error}")));
    }

    let hash = result
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Ledger("tx response missing hash".to_string()))?
        .to_string();
    let validated = result
        .get("validated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let ledger_index = result.get("ledger_index").and_then(Value::as_u64);
    let delivered_drops = result
        .pointer("/meta/delivered_amount")
        .and_then(Value::as_str)
        .and_then(|amount| amount.parse().ok())
        .unwrap_or(0);
    let account = result
        .get("Account")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let destination = result
        .get("Destination")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let memos = result
        .get("Memos")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.pointer("/Memo/MemoData").and_then(Value::as_str))
                .filter_map(|field| decode_memo(field).ok())
                .collect()
        })
        .unwrap_or_default();

    Ok(ObservedPayment {
        hash,
        validated,
        ledger_index,
        delivered_drops,
        account,
        destination,
        memos,
    })
}
