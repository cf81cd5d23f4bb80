use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{is_valid_address, normalize_hex, DelegationBundle, Market, Position, TokenAmount};
use crate::config::ExecutionConfig;
use crate::error::{ExecError, Result};

/// One named step of a strategy pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    BuyPt,
    SellPt,
    RedeemPt,
    ClaimRewards,
    Swap,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::BuyPt => "buyPt",
            StepKind::SellPt => "sellPt",
            StepKind::RedeemPt => "redeemPt",
            StepKind::ClaimRewards => "claimRewards",
            StepKind::Swap => "swap",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a run only plans or also submits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Plan every step and count transactions, submit nothing
    #[default]
    Plan,
    /// Plan and submit
    Execute,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Execute => "execute",
        }
    }

    pub fn submits(&self) -> bool {
        matches!(self, Self::Execute)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plan" | "dry-run" | "dry_run" => Ok(Self::Plan),
            "execute" | "exec" | "live" => Ok(Self::Execute),
            _ => Err("invalid execution mode; expected plan|execute"),
        }
    }
}

/// Per-call strategy parameters. Passed by value into every entry point.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub wallet_address: String,
    pub mode: ExecutionMode,
    /// Slippage tolerance as a fraction (0.005 = 0.5%)
    pub slippage: Decimal,
    /// Extra attempts per planning call / submission (total = max_retries + 1)
    pub max_retries: u32,
    /// Total listing calls while positions are not yet visible
    pub position_lookup_attempts: u32,
    pub position_lookup_delay_ms: u64,
    /// Per-call timeout for planning and submission; None = no timeout
    pub call_timeout_ms: Option<u64>,
    /// Non-underlying rewards below this amount are not swapped when compounding
    pub min_swap_amount: Decimal,
    /// Overrides the wall clock for maturity checks
    pub now: Option<DateTime<Utc>>,
    pub delegation_bundle: Option<DelegationBundle>,
}

impl StrategyConfig {
    pub fn new(wallet_address: impl AsRef<str>, mode: ExecutionMode) -> Self {
        Self {
            wallet_address: normalize_hex(wallet_address.as_ref()),
            mode,
            slippage: dec!(0.005),
            max_retries: 2,
            position_lookup_attempts: 3,
            position_lookup_delay_ms: 1_000,
            call_timeout_ms: None,
            min_swap_amount: Decimal::ZERO,
            now: None,
            delegation_bundle: None,
        }
    }

    /// Seed per-call parameters from the loaded execution settings
    pub fn from_execution(
        wallet_address: impl AsRef<str>,
        mode: ExecutionMode,
        execution: &ExecutionConfig,
    ) -> Self {
        Self {
            slippage: execution.slippage,
            max_retries: execution.max_retries,
            position_lookup_attempts: execution.position_lookup_attempts,
            position_lookup_delay_ms: execution.position_lookup_delay_ms,
            call_timeout_ms: (execution.call_timeout_ms > 0).then_some(execution.call_timeout_ms),
            min_swap_amount: execution.min_swap_amount,
            ..Self::new(wallet_address, mode)
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_slippage(mut self, slippage: Decimal) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_position_lookup(mut self, attempts: u32, delay_ms: u64) -> Self {
        self.position_lookup_attempts = attempts;
        self.position_lookup_delay_ms = delay_ms;
        self
    }

    pub fn with_call_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.call_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_min_swap_amount(mut self, amount: Decimal) -> Self {
        self.min_swap_amount = amount;
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_delegation_bundle(mut self, bundle: DelegationBundle) -> Self {
        self.delegation_bundle = Some(bundle);
        self
    }

    /// Current time for maturity decisions
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Fail fast on malformed configuration; never retried
    pub fn validate(&self) -> Result<()> {
        if self.wallet_address.is_empty() {
            return Err(ExecError::Validation("wallet address is required".into()));
        }
        if !is_valid_address(&self.wallet_address) {
            return Err(ExecError::Validation(format!(
                "invalid wallet address: {}",
                self.wallet_address
            )));
        }
        if self.slippage < Decimal::ZERO || self.slippage >= Decimal::ONE {
            return Err(ExecError::Validation(format!(
                "slippage must be in [0, 1), got {}",
                self.slippage
            )));
        }
        if self.min_swap_amount < Decimal::ZERO {
            return Err(ExecError::Validation("min swap amount cannot be negative".into()));
        }
        Ok(())
    }
}

/// Fund a target market's PT from a funding token
#[derive(Debug, Clone)]
pub struct InitialDepositRequest {
    pub config: StrategyConfig,
    pub target_market: Market,
    pub funding: TokenAmount,
}

/// Move a PT position from one market to another before maturity
#[derive(Debug, Clone)]
pub struct RebalanceRequest {
    pub config: StrategyConfig,
    pub current_market: Market,
    pub target_market: Market,
    pub position: Position,
}

/// Redeem a matured PT position and roll the proceeds into another market
#[derive(Debug, Clone)]
pub struct RolloverRequest {
    pub config: StrategyConfig,
    pub current_market: Market,
    pub target_market: Market,
    pub position: Position,
}

/// Claim YT rewards, swap them to the underlying and buy more PT
#[derive(Debug, Clone)]
pub struct CompoundRequest {
    pub config: StrategyConfig,
    pub market: Market,
    pub position: Position,
}

/// Exit every position the wallet holds on the given chains
#[derive(Debug, Clone)]
pub struct UnwindRequest {
    pub config: StrategyConfig,
    pub chain_ids: Vec<String>,
}
