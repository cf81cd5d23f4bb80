use serde::{Deserialize, Serialize};

use super::normalize_hex;

/// Transaction envelope type understood by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionKind {
    #[default]
    #[serde(rename = "EVM_TX")]
    EvmTx,
}

/// One unsigned transaction descriptor produced by the actions API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(rename = "type", default)]
    pub kind: TransactionKind,
    pub to: String,
    pub data: String,
    #[serde(default = "zero_value")]
    pub value: String,
    pub chain_id: String,
}

fn zero_value() -> String {
    "0".to_string()
}

impl TransactionRequest {
    pub fn new(chain_id: impl Into<String>, to: &str, data: &str, value: impl Into<String>) -> Self {
        Self {
            kind: TransactionKind::EvmTx,
            to: normalize_hex(to),
            data: normalize_hex(data),
            value: value.into(),
            chain_id: chain_id.into(),
        }
    }

    /// Lowercase `to` and `data`
    pub fn normalized(mut self) -> Self {
        self.to = normalize_hex(&self.to);
        self.data = normalize_hex(&self.data);
        self.value = self.value.trim().to_string();
        if self.value.is_empty() {
            self.value = zero_value();
        }
        self
    }
}

/// Ordered batch of transactions for one logical step, consumed left to right
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPlan {
    pub transactions: Vec<TransactionRequest>,
}

impl TransactionPlan {
    pub fn new(transactions: Vec<TransactionRequest>) -> Self {
        Self {
            transactions: transactions
                .into_iter()
                .map(TransactionRequest::normalized)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransactionRequest> {
        self.transactions.iter()
    }
}

/// Result of submitting one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
}

/// Pre-signed delegation used to execute a batch on the wallet's behalf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationBundle {
    pub delegator_address: String,
    pub delegate_address: String,
    #[serde(default)]
    pub delegations: Vec<serde_json::Value>,
}

/// Result of an atomic delegated batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedExecution {
    pub tx_hashes: Vec<String>,
    #[serde(default)]
    pub receipts: Vec<serde_json::Value>,
}
