use tracing::info;

use crate::domain::{ExecutionOutcome, InitialDepositRequest};
use crate::error::Result;

use super::StrategyRunner;

impl StrategyRunner {
    /// Buy target-market PT with the funding token. Single step.
    pub async fn execute_initial_deposit(
        &self,
        request: InitialDepositRequest,
    ) -> Result<ExecutionOutcome> {
        let run = self.start("initialDeposit", &request.config)?;
        let mut outcome = ExecutionOutcome::new();
        outcome.record_positions(1);

        let buy = run
            .planner
            .buy_pt(&request.target_market, &request.funding)
            .await?;
        run.execute(&buy, &mut outcome).await?;

        if let Some(pt) = &buy.output {
            info!(market = %request.target_market.label(), pt = %pt, "deposit planned PT out");
        }
        Ok(run.finish(outcome))
    }
}
