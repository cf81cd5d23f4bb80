use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::{CompoundRequest, ExecutionOutcome, Market, StepKind, TokenAmount};
use crate::error::{ExecError, Result};

use super::{ensure_position_in_market, StrategyRunner};

/// How one claimed reward reaches the final buy
#[derive(Debug, Clone, PartialEq)]
pub enum CompoundLeg {
    /// Already denominated in the underlying; added to the buy as-is
    Direct(TokenAmount),
    /// Swapped into the underlying first; the swap output is added
    Swap(TokenAmount),
    /// Below the minimum swap amount; stays in the wallet
    Dust(TokenAmount),
}

impl CompoundLeg {
    /// One leg per positive claimable reward, in reward order
    pub fn plan(market: &Market, rewards: &[TokenAmount], min_swap_amount: Decimal) -> Vec<Self> {
        rewards
            .iter()
            .filter(|reward| reward.is_positive())
            .map(|reward| {
                if reward.token.is_same_token(&market.underlying_token) {
                    CompoundLeg::Direct(reward.clone())
                } else if reward.amount < min_swap_amount {
                    CompoundLeg::Dust(reward.clone())
                } else {
                    CompoundLeg::Swap(reward.clone())
                }
            })
            .collect()
    }
}

impl StrategyRunner {
    /// Claim YT rewards, swap the non-underlying ones into the underlying and
    /// buy PT with the total.
    ///
    /// The buy amount is the underlying-denominated claim portion plus every
    /// swap's planned `exactToAmount`. A position without claimable rewards
    /// plans nothing.
    pub async fn execute_compound(&self, request: CompoundRequest) -> Result<ExecutionOutcome> {
        let CompoundRequest {
            config,
            market,
            position,
        } = request;

        let run = self.start("compound", &config)?;
        ensure_position_in_market(&position, &market)?;

        let mut outcome = ExecutionOutcome::new();
        outcome.record_positions(1);

        let rewards: Vec<TokenAmount> = position.claimable_rewards().cloned().collect();
        if rewards.is_empty() {
            info!(market = %market.label(), "no claimable rewards, nothing to compound");
            return Ok(run.finish(outcome));
        }

        let legs = CompoundLeg::plan(&market, &rewards, run.config.min_swap_amount);

        let claim = run.planner.claim_rewards(&position.yt.token).await?;
        run.execute(&claim, &mut outcome).await?;

        let underlying = &market.underlying_token;
        let mut total = Decimal::ZERO;
        for leg in &legs {
            match leg {
                CompoundLeg::Direct(reward) => {
                    debug!(reward = %reward, "reward already in underlying");
                    total += reward.amount;
                }
                CompoundLeg::Swap(reward) => {
                    let swap = run.planner.swap(reward, underlying).await?;
                    run.execute(&swap, &mut outcome).await?;

                    let out = swap.require_output()?;
                    if !out.token.is_same_token(underlying) {
                        return Err(ExecError::Planning {
                            step: StepKind::Swap,
                            message: format!(
                                "swap of {} returned {}, expected {}",
                                reward, out.token.symbol, underlying.symbol
                            ),
                        });
                    }
                    total += out.amount;
                }
                CompoundLeg::Dust(reward) => {
                    debug!(
                        reward = %reward,
                        min_swap_amount = %run.config.min_swap_amount,
                        "reward below minimum swap amount, left unswapped"
                    );
                }
            }
        }

        if total <= Decimal::ZERO {
            info!(market = %market.label(), "claimed rewards too small to compound");
            return Ok(run.finish(outcome));
        }

        let buy_input = TokenAmount::new(underlying.clone(), total);
        info!(market = %market.label(), amount = %buy_input, legs = legs.len(), "compounding into PT");

        let buy = run.planner.buy_pt(&market, &buy_input).await?;
        run.execute(&buy, &mut outcome).await?;

        Ok(run.finish(outcome))
    }
}
