use tracing::{info, warn};

use crate::domain::{ExecutionOutcome, RebalanceRequest};
use crate::error::Result;

use super::{ensure_position_in_market, StrategyRunner};

impl StrategyRunner {
    /// Sell the current market's PT, then buy target PT with the sale proceeds.
    ///
    /// The buy's input token and amount are the sell's planned `tokenOut` and
    /// `exactAmountOut`; realized balances are not re-read after the sell.
    pub async fn execute_rebalance(&self, request: RebalanceRequest) -> Result<ExecutionOutcome> {
        let RebalanceRequest {
            config,
            current_market,
            target_market,
            position,
        } = request;

        let run = self.start("rebalance", &config)?;
        ensure_position_in_market(&position, &current_market)?;
        if current_market.is_matured(run.config.now()) {
            warn!(
                market = %current_market.label(),
                "current market already matured; selling instead of redeeming"
            );
        }

        let mut outcome = ExecutionOutcome::new();
        outcome.record_positions(1);

        let sell = run.planner.sell_pt(&current_market, position.pt.amount).await?;
        run.execute(&sell, &mut outcome).await?;

        let proceeds = sell.require_output()?.clone();
        info!(
            from = %current_market.label(),
            to = %target_market.label(),
            proceeds = %proceeds,
            "rebalancing sale proceeds into target market"
        );

        let buy = run.planner.buy_pt(&target_market, &proceeds).await?;
        run.execute(&buy, &mut outcome).await?;

        Ok(run.finish(outcome))
    }
}
