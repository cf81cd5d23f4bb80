//! Action planning: strategy step -> unsigned transactions
//!
//! Every call is wrapped in the run's `RetryPolicy` here, at the call site;
//! the actions client itself never retries.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use crate::adapters::{
    BuyPtRequest, ClaimRewardsRequest, HasTransactions, OnchainActionsClient, RedeemPtRequest,
    SellPtRequest, SwapRequest,
};
use crate::domain::{
    format_amount, Market, StepKind, TokenAmount, TokenIdentity, TransactionPlan,
};
use crate::error::{ExecError, Result};

use super::retry::RetryPolicy;

/// A planned step: its transactions plus the output the next step consumes
#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub kind: StepKind,
    /// Market or token the step acts on, e.g. `buyPt` keys on market plus input token
    pub subject: String,
    pub plan: TransactionPlan,
    /// Planned output (`tokenOut`/`exactAmountOut`, `toToken`/`exactToAmount`)
    pub output: Option<TokenAmount>,
}

impl PlannedStep {
    /// Output the next step depends on; missing output is an upstream contract breach
    pub fn require_output(&self) -> Result<&TokenAmount> {
        self.output.as_ref().ok_or_else(|| ExecError::Planning {
            step: self.kind,
            message: "planning response carried no output amount".into(),
        })
    }
}

pub struct ActionPlanner {
    client: Arc<dyn OnchainActionsClient>,
    retry: RetryPolicy,
    wallet_address: String,
    slippage: Decimal,
}

impl ActionPlanner {
    pub fn new(
        client: Arc<dyn OnchainActionsClient>,
        retry: RetryPolicy,
        wallet_address: impl Into<String>,
        slippage: Decimal,
    ) -> Self {
        Self {
            client,
            retry,
            wallet_address: wallet_address.into(),
            slippage,
        }
    }

    /// Amounts are sent exactly as planned; only non-positive values are rejected.
    fn amount_arg(token: &TokenIdentity, amount: Decimal, step: StepKind) -> Result<String> {
        if amount <= Decimal::ZERO {
            return Err(ExecError::Validation(format!(
                "{step}: amount must be positive, got {amount} {}",
                token.symbol
            )));
        }
        Ok(format_amount(amount))
    }

    /// Buy PT of `market` with `input`
    pub async fn buy_pt(&self, market: &Market, input: &TokenAmount) -> Result<PlannedStep> {
        let step = StepKind::BuyPt;
        let request = BuyPtRequest {
            wallet_address: self.wallet_address.clone(),
            market_address: market.market_identifier.address.clone(),
            input_token_uid: input.token.token_uid.clone(),
            amount: Self::amount_arg(&input.token, input.amount, step)?,
            slippage: format_amount(self.slippage),
        };

        let response = self
            .retry
            .run(step.as_str(), || self.client.create_tokenized_yield_buy_pt(&request))
            .await
            .map_err(|e| e.into_planning(step))?;

        let plan = response.transaction_plan();
        info!(
            market = %market.label(),
            input = %input,
            txs = plan.len(),
            "planned buyPt"
        );

        Ok(PlannedStep {
            kind: step,
            subject: format!("{}/{}", market.id(), input.token.token_uid),
            output: response
                .exact_pt_amount_out
                .map(|amount| TokenAmount::new(market.pt_token.clone(), amount)),
            plan,
        })
    }

    /// Sell the position's PT before maturity
    pub async fn sell_pt(&self, market: &Market, pt_amount: Decimal) -> Result<PlannedStep> {
        let step = StepKind::SellPt;
        let request = SellPtRequest {
            wallet_address: self.wallet_address.clone(),
            pt_token_uid: market.pt_token.token_uid.clone(),
            amount: Self::amount_arg(&market.pt_token, pt_amount, step)?,
            slippage: format_amount(self.slippage),
        };

        let response = self
            .retry
            .run(step.as_str(), || self.client.create_tokenized_yield_sell_pt(&request))
            .await
            .map_err(|e| e.into_planning(step))?;

        let output = TokenAmount::new(response.token_out.clone(), response.exact_amount_out);
        info!(market = %market.label(), out = %output, "planned sellPt");

        Ok(PlannedStep {
            kind: step,
            subject: market.pt_token.token_uid.to_string(),
            plan: response.transaction_plan(),
            output: Some(output),
        })
    }

    /// Redeem PT 1:1 for the underlying after maturity
    pub async fn redeem_pt(&self, market: &Market, pt_amount: Decimal) -> Result<PlannedStep> {
        let step = StepKind::RedeemPt;
        let request = RedeemPtRequest {
            wallet_address: self.wallet_address.clone(),
            pt_token_uid: market.pt_token.token_uid.clone(),
            amount: Self::amount_arg(&market.pt_token, pt_amount, step)?,
        };

        let response = self
            .retry
            .run(step.as_str(), || self.client.create_tokenized_yield_redeem_pt(&request))
            .await
            .map_err(|e| e.into_planning(step))?;

        let output = TokenAmount::new(response.token_out.clone(), response.exact_amount_out);
        info!(market = %market.label(), out = %output, "planned redeemPt");

        Ok(PlannedStep {
            kind: step,
            subject: market.pt_token.token_uid.to_string(),
            plan: response.transaction_plan(),
            output: Some(output),
        })
    }

    /// Claim every reward accrued on `yt_token`
    pub async fn claim_rewards(&self, yt_token: &TokenIdentity) -> Result<PlannedStep> {
        let step = StepKind::ClaimRewards;
        let request = ClaimRewardsRequest {
            wallet_address: self.wallet_address.clone(),
            yt_token_uid: yt_token.token_uid.clone(),
        };

        let response = self
            .retry
            .run(step.as_str(), || {
                self.client.create_tokenized_yield_claim_rewards(&request)
            })
            .await
            .map_err(|e| e.into_planning(step))?;

        let plan = response.transaction_plan();
        debug!(yt = %yt_token.symbol, txs = plan.len(), "planned claimRewards");

        Ok(PlannedStep {
            kind: step,
            subject: yt_token.token_uid.to_string(),
            plan,
            output: None,
        })
    }

    /// Exact-in swap of `from` into `to`
    pub async fn swap(&self, from: &TokenAmount, to: &TokenIdentity) -> Result<PlannedStep> {
        let step = StepKind::Swap;
        let request = SwapRequest {
            wallet_address: self.wallet_address.clone(),
            amount: Self::amount_arg(&from.token, from.amount, step)?,
            amount_type: "exactIn".to_string(),
            from_token_uid: from.token.token_uid.clone(),
            to_token_uid: to.token_uid.clone(),
            slippage_tolerance: format_amount(self.slippage),
        };

        let response = self
            .retry
            .run(step.as_str(), || self.client.create_swap(&request))
            .await
            .map_err(|e| e.into_planning(step))?;

        let output = TokenAmount::new(response.to_token.clone(), response.exact_to_amount);
        info!(from = %from, to = %output, "planned swap");

        Ok(PlannedStep {
            kind: step,
            subject: format!("{}/{}", from.token.token_uid, to.token_uid),
            plan: response.transaction_plan(),
            output: Some(output),
        })
    }
}
