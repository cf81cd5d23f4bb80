//! Transaction submission collaborators
//!
//! Signing lives outside this crate. `RelayerClient` forwards unsigned
//! transactions to a signing relayer that owns the wallet key.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::RelayerConfig;
use crate::domain::{DelegatedExecution, DelegationBundle, TransactionRequest, TxReceipt};
use crate::error::{ExecError, Result};

/// Signs and submits one transaction, returning its hash once confirmed.
///
/// `idempotency_key` is stable across retries of the same transaction within
/// a run; implementations should refuse to send a second transaction for a key
/// that already landed and return the original receipt instead.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn execute_transaction(
        &self,
        tx: &TransactionRequest,
        idempotency_key: &str,
    ) -> Result<TxReceipt>;
}

/// Executes a batch under a pre-signed delegation, atomically from the caller's view.
#[async_trait]
pub trait DelegatedExecutor: Send + Sync {
    async fn redeem_delegations_and_execute_transactions(
        &self,
        bundle: &DelegationBundle,
        transactions: &[TransactionRequest],
    ) -> Result<DelegatedExecution>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DelegatedBatch<'a> {
    bundle: &'a DelegationBundle,
    transactions: &'a [TransactionRequest],
}

/// HTTP client for a signing relayer
#[derive(Clone)]
pub struct RelayerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RelayerClient {
    pub fn new(config: &RelayerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.post(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn read_json<R: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        path: &str,
    ) -> Result<R> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, path, "relayer rejected request");
            return Err(ExecError::Upstream(format!("{path} returned HTTP {status}: {body}")));
        }
        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl TransactionExecutor for RelayerClient {
    #[instrument(skip(self, tx), fields(chain = %tx.chain_id, to = %tx.to))]
    async fn execute_transaction(
        &self,
        tx: &TransactionRequest,
        idempotency_key: &str,
    ) -> Result<TxReceipt> {
        debug!(idempotency_key, "submitting transaction to relayer");
        let response = self
            .request("/transactions")
            .header("Idempotency-Key", idempotency_key)
            .json(tx)
            .send()
            .await?;

        let receipt: TxReceipt = Self::read_json(response, "/transactions").await?;
        info!(tx_hash = %receipt.transaction_hash, "transaction confirmed");
        Ok(receipt)
    }
}

#[async_trait]
impl DelegatedExecutor for RelayerClient {
    #[instrument(skip_all, fields(delegator = %bundle.delegator_address, txs = transactions.len()))]
    async fn redeem_delegations_and_execute_transactions(
        &self,
        bundle: &DelegationBundle,
        transactions: &[TransactionRequest],
    ) -> Result<DelegatedExecution> {
        let response = self
            .request("/delegations/execute")
            .json(&DelegatedBatch {
                bundle,
                transactions,
            })
            .send()
            .await?;

        let execution: DelegatedExecution =
            Self::read_json(response, "/delegations/execute").await?;
        info!(hashes = execution.tx_hashes.len(), "delegated batch confirmed");
        Ok(execution)
    }
}
