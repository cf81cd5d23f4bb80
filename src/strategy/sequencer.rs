//! Step execution
//!
//! Submits a planned step's transactions one at a time, in plan order, each
//! wrapped in the run's retry policy. A step finishes only once all of its
//! transactions confirmed, so the caller can plan the dependent step next.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::{DelegatedExecutor, TransactionExecutor};
use crate::coordination::CancelToken;
use crate::domain::{DelegationBundle, ExecutionMode, ExecutionOutcome, TransactionRequest};
use crate::error::{ExecError, Result};

use super::planner::PlannedStep;
use super::retry::RetryPolicy;

/// How one run submits its steps
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub mode: ExecutionMode,
    pub delegation: Option<DelegationBundle>,
}

impl RunContext {
    pub fn new(mode: ExecutionMode, delegation: Option<DelegationBundle>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            delegation,
        }
    }
}

pub struct StepSequencer {
    executor: Arc<dyn TransactionExecutor>,
    delegated: Option<Arc<dyn DelegatedExecutor>>,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl StepSequencer {
    pub fn new(
        executor: Arc<dyn TransactionExecutor>,
        delegated: Option<Arc<dyn DelegatedExecutor>>,
        retry: RetryPolicy,
        cancel: CancelToken,
    ) -> Self {
        Self {
            executor,
            delegated,
            retry,
            cancel,
        }
    }

    /// Stable key for one transaction of one step within a run.
    ///
    /// Retries of the same transaction reuse the key; a second run gets new keys.
    /// The step's subject keeps identical transactions on different positions apart.
    pub fn idempotency_key(
        run_id: &Uuid,
        step: &PlannedStep,
        index: usize,
        tx: &TransactionRequest,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(run_id.as_bytes());
        hasher.update(step.kind.as_str().as_bytes());
        hasher.update(step.subject.as_bytes());
        hasher.update((index as u64).to_le_bytes());
        hasher.update(tx.chain_id.as_bytes());
        hasher.update(tx.to.as_bytes());
        hasher.update(tx.data.as_bytes());
        hasher.update(tx.value.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Execute one planned step, appending to `outcome`.
    ///
    /// Plan mode only counts the transactions. On error the hashes of
    /// transactions that already confirmed stay in `outcome`.
    pub async fn run_step(
        &self,
        ctx: &RunContext,
        step: &PlannedStep,
        outcome: &mut ExecutionOutcome,
    ) -> Result<()> {
        self.cancel.check()?;
        outcome.record_planned(step.plan.len());

        if !ctx.mode.submits() {
            debug!(step = %step.kind, txs = step.plan.len(), "plan mode, not submitting");
            return Ok(());
        }
        if step.plan.is_empty() {
            debug!(step = %step.kind, "step planned no transactions");
            return Ok(());
        }

        if let Some(bundle) = &ctx.delegation {
            return self.run_delegated(bundle, step, outcome).await;
        }

        for (index, tx) in step.plan.iter().enumerate() {
            self.cancel.check()?;

            let key = Self::idempotency_key(&ctx.run_id, step, index, tx);
            let receipt = self
                .retry
                .run(step.kind.as_str(), || self.executor.execute_transaction(tx, &key))
                .await
                .map_err(|e| e.into_submission(step.kind))?;

            info!(
                step = %step.kind,
                index,
                of = step.plan.len(),
                tx_hash = %receipt.transaction_hash,
                "transaction confirmed"
            );
            outcome.record_hash(receipt.transaction_hash);
        }

        Ok(())
    }

    /// Whole step as one delegated batch; not retried
    async fn run_delegated(
        &self,
        bundle: &DelegationBundle,
        step: &PlannedStep,
        outcome: &mut ExecutionOutcome,
    ) -> Result<()> {
        let delegated = self.delegated.as_ref().ok_or_else(|| {
            ExecError::Validation("delegation bundle supplied but no delegated executor".into())
        })?;

        let execution = delegated
            .redeem_delegations_and_execute_transactions(bundle, &step.plan.transactions)
            .await
            .map_err(|e| ExecError::Delegation(format!("{}: {e}", step.kind)))?;

        if execution.tx_hashes.is_empty() {
            warn!(step = %step.kind, "delegated batch returned no hashes");
        }
        info!(step = %step.kind, hashes = execution.tx_hashes.len(), "delegated batch confirmed");
        for hash in execution.tx_hashes {
            outcome.record_hash(hash);
        }
        Ok(())
    }

    /// Fail fast when the run cannot possibly submit
    pub fn check_ready(&self, ctx: &RunContext) -> Result<()> {
        if ctx.mode.submits() && ctx.delegation.is_some() && self.delegated.is_none() {
            return Err(ExecError::Validation(
                "delegation bundle supplied but no delegated executor configured".into(),
            ));
        }
        Ok(())
    }
}
