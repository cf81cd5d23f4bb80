//! Strategy entry points
//!
//! Each strategy is a fixed pipeline of planned steps. A step is planned,
//! then executed, and only then is the next (dependent) step planned from the
//! previous step's planned output. Planner and sequencer are built fresh for
//! every call from its `StrategyConfig`, so runs share no mutable state.

mod compound;
mod deposit;
mod rebalance;
mod rollover;
mod unwind;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::adapters::{DelegatedExecutor, OnchainActionsClient, TransactionExecutor};
use crate::coordination::CancelToken;
use crate::domain::{ExecutionOutcome, Market, Position, StrategyConfig};
use crate::error::{ExecError, Result};

use super::planner::{ActionPlanner, PlannedStep};
use super::retry::RetryPolicy;
use super::sequencer::{RunContext, StepSequencer};

pub use compound::CompoundLeg;

/// Runs strategies against injected collaborators
pub struct StrategyRunner {
    actions: Arc<dyn OnchainActionsClient>,
    executor: Arc<dyn TransactionExecutor>,
    delegated: Option<Arc<dyn DelegatedExecutor>>,
    cancel: CancelToken,
    unwind_concurrency: usize,
}

impl StrategyRunner {
    pub fn new(
        actions: Arc<dyn OnchainActionsClient>,
        executor: Arc<dyn TransactionExecutor>,
    ) -> Self {
        Self {
            actions,
            executor,
            delegated: None,
            cancel: CancelToken::new(),
            unwind_concurrency: 1,
        }
    }

    pub fn with_delegated_executor(mut self, delegated: Arc<dyn DelegatedExecutor>) -> Self {
        self.delegated = Some(delegated);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Positions unwound concurrently; clamped to at least 1
    pub fn with_unwind_concurrency(mut self, concurrency: usize) -> Self {
        self.unwind_concurrency = concurrency.max(1);
        self
    }

    /// Validate the config and assemble the per-call collaborators
    fn start(&self, strategy: &'static str, config: &StrategyConfig) -> Result<Run> {
        config.validate()?;
        self.cancel.check()?;

        let retry = RetryPolicy::new(config.max_retries)
            .with_call_timeout(config.call_timeout_ms.map(Duration::from_millis));
        let planner = ActionPlanner::new(
            self.actions.clone(),
            retry,
            config.wallet_address.clone(),
            config.slippage,
        );
        let sequencer = StepSequencer::new(
            self.executor.clone(),
            self.delegated.clone(),
            retry,
            self.cancel.clone(),
        );
        let ctx = RunContext::new(config.mode, config.delegation_bundle.clone());
        sequencer.check_ready(&ctx)?;

        info!(
            strategy,
            run_id = %ctx.run_id,
            wallet = %config.wallet_address,
            mode = %config.mode,
            max_retries = config.max_retries,
            delegated = ctx.delegation.is_some(),
            "starting strategy run"
        );

        Ok(Run {
            strategy,
            retry,
            planner,
            sequencer,
            ctx,
            config: config.clone(),
        })
    }
}

/// Everything one strategy call needs; dropped when the call returns
struct Run {
    strategy: &'static str,
    retry: RetryPolicy,
    planner: ActionPlanner,
    sequencer: StepSequencer,
    ctx: RunContext,
    config: StrategyConfig,
}

impl Run {
    async fn execute(&self, step: &PlannedStep, outcome: &mut ExecutionOutcome) -> Result<()> {
        self.sequencer.run_step(&self.ctx, step, outcome).await
    }

    fn finish(&self, outcome: ExecutionOutcome) -> ExecutionOutcome {
        info!(
            strategy = self.strategy,
            run_id = %self.ctx.run_id,
            mode = %self.ctx.mode,
            positions = outcome.position_count,
            planned = outcome.transaction_count,
            submitted = outcome.submitted(),
            failures = outcome.failures.len(),
            "strategy run finished"
        );
        outcome
    }
}

/// A single-position strategy only acts on a position of the market it names
fn ensure_position_in_market(position: &Position, market: &Market) -> Result<()> {
    if position.market_id() != market.id() {
        return Err(ExecError::Validation(format!(
            "position belongs to {}, not {}",
            position.market_id(),
            market.id()
        )));
    }
    debug!(market = %market.label(), pt = %position.pt, "position matches market");
    Ok(())
}
