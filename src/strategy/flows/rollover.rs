use tracing::info;

use crate::domain::{ExecutionOutcome, RolloverRequest};
use crate::error::{ExecError, Result};

use super::{ensure_position_in_market, StrategyRunner};

impl StrategyRunner {
    /// Redeem matured PT, then buy target PT with the redeemed underlying.
    ///
    /// Fails with `Validation` before any planning call when the current
    /// market has not matured yet.
    pub async fn execute_rollover(&self, request: RolloverRequest) -> Result<ExecutionOutcome> {
        let RolloverRequest {
            config,
            current_market,
            target_market,
            position,
        } = request;

        let run = self.start("rollover", &config)?;
        ensure_position_in_market(&position, &current_market)?;

        let now = run.config.now();
        if !current_market.is_matured(now) {
            return Err(ExecError::Validation(format!(
                "{} matures at {}, {}s from now; rollover needs a matured market",
                current_market.label(),
                current_market.expiry.to_rfc3339(),
                current_market.seconds_to_expiry(now)
            )));
        }

        let mut outcome = ExecutionOutcome::new();
        outcome.record_positions(1);

        let redeem = run.planner.redeem_pt(&current_market, position.pt.amount).await?;
        run.execute(&redeem, &mut outcome).await?;

        let redeemed = redeem.require_output()?.clone();
        info!(
            from = %current_market.label(),
            to = %target_market.label(),
            redeemed = %redeemed,
            "rolling redeemed underlying into target market"
        );

        let buy = run.planner.buy_pt(&target_market, &redeemed).await?;
        run.execute(&buy, &mut outcome).await?;

        Ok(run.finish(outcome))
    }
}
