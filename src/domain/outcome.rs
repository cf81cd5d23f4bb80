use serde::{Deserialize, Serialize};

use super::{MarketId, StepKind};

/// Why one position of a batch run stopped early
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFailure {
    pub market_identifier: MarketId,
    /// Step that failed; None when the position could not be resolved at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepKind>,
    pub error: String,
}

impl std::fmt::Display for PositionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.step {
            Some(step) => write!(f, "{} failed at {}: {}", self.market_identifier, step, self.error),
            None => write!(f, "{} failed: {}", self.market_identifier, self.error),
        }
    }
}

/// Accumulated result of a strategy run.
///
/// Created empty, appended to as steps are planned and transactions confirm,
/// returned once. Never rolled back: partial progress is surfaced as-is.
/// `transaction_count` counts planned transactions (also in plan mode) while
/// `tx_hashes` only holds confirmed submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub tx_hashes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tx_hash: Option<String>,
    pub position_count: usize,
    pub transaction_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PositionFailure>,
}

impl ExecutionOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count transactions that a step planned
    pub fn record_planned(&mut self, transactions: usize) {
        self.transaction_count += transactions;
    }

    /// Append a confirmed hash
    pub fn record_hash(&mut self, hash: impl Into<String>) {
        let hash = hash.into();
        self.last_tx_hash = Some(hash.clone());
        self.tx_hashes.push(hash);
    }

    pub fn record_positions(&mut self, positions: usize) {
        self.position_count += positions;
    }

    pub fn record_failure(&mut self, failure: PositionFailure) {
        self.failures.push(failure);
    }

    /// Fold another (per-position or per-phase) outcome into this one,
    /// keeping hash order: self's hashes first, then other's.
    pub fn merge(&mut self, other: ExecutionOutcome) {
        if other.last_tx_hash.is_some() {
            self.last_tx_hash = other.last_tx_hash;
        }
        self.tx_hashes.extend(other.tx_hashes);
        self.position_count += other.position_count;
        self.transaction_count += other.transaction_count;
        self.failures.extend(other.failures);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn submitted(&self) -> usize {
        self.tx_hashes.len()
    }
}
