use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::domain::{
    ExecutionOutcome, Market, MarketId, Position, PositionFailure, StepKind, UnwindRequest,
};
use crate::error::{ExecError, Result};
use crate::strategy::scanner::PositionScanner;

use super::{Run, StrategyRunner};

/// What one position contributed to one unwind phase
struct PositionRun {
    outcome: ExecutionOutcome,
    failure: Option<PositionFailure>,
}

impl PositionRun {
    fn done(outcome: ExecutionOutcome) -> Self {
        Self {
            outcome,
            failure: None,
        }
    }

    fn failed(
        outcome: ExecutionOutcome,
        position: &Position,
        step: Option<StepKind>,
        error: ExecError,
    ) -> Self {
        warn!(
            market = %position.market_id(),
            step = step.map(|s| s.as_str()).unwrap_or("resolve"),
            confirmed = outcome.submitted(),
            error = %error,
            "position skipped for the rest of the unwind"
        );
        Self {
            outcome,
            failure: Some(PositionFailure {
                market_identifier: position.market_id().clone(),
                step,
                error: error.to_string(),
            }),
        }
    }
}

impl StrategyRunner {
    /// Exit every open position of the wallet on `chain_ids`.
    ///
    /// Phase one claims rewards for every position that has any; phase two
    /// redeems matured PT and sells the rest. Every claim finishes before the
    /// first exit starts. A failing position is recorded in
    /// `outcome.failures` and skipped from then on; the others carry on.
    pub async fn execute_unwind(&self, request: UnwindRequest) -> Result<ExecutionOutcome> {
        let UnwindRequest { config, chain_ids } = request;
        let run = self.start("unwind", &config)?;
        if chain_ids.is_empty() {
            return Err(ExecError::Validation(
                "unwind needs at least one chain id".into(),
            ));
        }

        let scanner = PositionScanner::new(self.actions.clone(), run.retry);
        let positions = scanner
            .scan(
                &run.config.wallet_address,
                &chain_ids,
                run.config.position_lookup_attempts,
                run.config.position_lookup_delay_ms,
            )
            .await?;

        let mut outcome = ExecutionOutcome::new();
        outcome.record_positions(positions.len());
        if positions.is_empty() {
            info!(wallet = %run.config.wallet_address, "no open positions to unwind");
            return Ok(run.finish(outcome));
        }

        let markets = scanner.markets(&chain_ids).await?;
        let now = run.config.now();
        let concurrency = self.unwind_concurrency;

        let claims: Vec<PositionRun> = stream::iter(positions.iter())
            .map(|position| run.claim_position(position))
            .buffered(concurrency)
            .collect()
            .await;
        let failed: Vec<bool> = claims
            .into_iter()
            .map(|result| fold(&mut outcome, result))
            .collect();

        info!(
            positions = positions.len(),
            claim_failures = failed.iter().filter(|f| **f).count(),
            "claim phase done, exiting principal"
        );

        let survivors = positions
            .iter()
            .zip(&failed)
            .filter(|(_, failed)| !**failed)
            .map(|(position, _)| position);
        let exits: Vec<PositionRun> = stream::iter(survivors)
            .map(|position| run.exit_position(position, &markets, now))
            .buffered(concurrency)
            .collect()
            .await;
        for result in exits {
            fold(&mut outcome, result);
        }

        Ok(run.finish(outcome))
    }
}

/// Single writer for the shared outcome; returns whether the position failed
fn fold(outcome: &mut ExecutionOutcome, result: PositionRun) -> bool {
    outcome.merge(result.outcome);
    match result.failure {
        Some(failure) => {
            outcome.record_failure(failure);
            true
        }
        None => false,
    }
}

impl Run {
    async fn claim_position(&self, position: &Position) -> PositionRun {
        let mut outcome = ExecutionOutcome::new();
        if !position.has_claimable_rewards() {
            return PositionRun::done(outcome);
        }

        match self.claim_step(position, &mut outcome).await {
            Ok(()) => PositionRun::done(outcome),
            Err(e) => PositionRun::failed(outcome, position, Some(StepKind::ClaimRewards), e),
        }
    }

    async fn claim_step(&self, position: &Position, outcome: &mut ExecutionOutcome) -> Result<()> {
        let claim = self.planner.claim_rewards(&position.yt.token).await?;
        self.execute(&claim, outcome).await
    }

    async fn exit_position(
        &self,
        position: &Position,
        markets: &HashMap<MarketId, Market>,
        now: DateTime<Utc>,
    ) -> PositionRun {
        let mut outcome = ExecutionOutcome::new();
        if !position.has_principal() {
            return PositionRun::done(outcome);
        }

        let Some(market) = markets.get(position.market_id()) else {
            let error = ExecError::MarketNotFound(position.market_id().to_string());
            return PositionRun::failed(outcome, position, None, error);
        };

        let step = if market.is_matured(now) {
            StepKind::RedeemPt
        } else {
            StepKind::SellPt
        };

        match self.exit_step(step, market, position, &mut outcome).await {
            Ok(()) => PositionRun::done(outcome),
            Err(e) => PositionRun::failed(outcome, position, Some(step), e),
        }
    }

    async fn exit_step(
        &self,
        step: StepKind,
        market: &Market,
        position: &Position,
        outcome: &mut ExecutionOutcome,
    ) -> Result<()> {
        let planned = match step {
            StepKind::RedeemPt => self.planner.redeem_pt(market, position.pt.amount).await?,
            _ => self.planner.sell_pt(market, position.pt.amount).await?,
        };
        info!(
            market = %market.label(),
            step = %step,
            pt = %position.pt,
            "exiting principal"
        );
        self.execute(&planned, outcome).await
    }
}
