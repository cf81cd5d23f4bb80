//! yieldex CLI - tokenized-yield strategy runner
//!
//! Commands:
//! - `yieldex markets`   - List tokenized-yield markets
//! - `yieldex positions` - List the wallet's open positions
//! - `yieldex deposit`   - Buy PT of a market with a funding token
//! - `yieldex rebalance` - Move a PT position to another market
//! - `yieldex rollover`  - Redeem a matured position into another market
//! - `yieldex compound`  - Claim rewards and buy more PT with them
//! - `yieldex unwind`    - Exit every open position
//!
//! Strategies default to `--mode plan`, which plans every step and submits nothing.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::domain::ExecutionMode;

/// Tokenized-yield strategy runner
#[derive(Parser, Debug)]
#[command(name = "yieldex")]
#[command(author, version, about = "Plan and execute tokenized-yield strategies")]
pub struct Cli {
    /// Directory holding default.toml and environment overrides
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tokenized-yield markets
    Markets {
        /// Chain ids to list (repeatable)
        #[arg(long = "chain", required = true)]
        chain_ids: Vec<String>,
    },

    /// List the wallet's open positions
    Positions {
        #[arg(long, env = "YIELDEX_WALLET")]
        wallet: String,

        #[arg(long = "chain", required = true)]
        chain_ids: Vec<String>,
    },

    /// Buy PT of a market with a funding token
    Deposit {
        #[command(flatten)]
        run: RunArgs,

        /// Chain id of the target market
        #[arg(long)]
        chain: String,

        /// Target market address
        #[arg(long)]
        market: String,

        /// Funding amount
        #[arg(long)]
        amount: Decimal,

        /// Funding token address (defaults to the market's underlying)
        #[arg(long)]
        token: Option<String>,

        /// Funding token decimals, used with --token
        #[arg(long, default_value = "18")]
        decimals: u32,
    },

    /// Sell the PT of one market and buy PT of another
    Rebalance {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long)]
        chain: String,

        /// Current market address
        #[arg(long)]
        from: String,

        /// Target market address
        #[arg(long)]
        to: String,
    },

    /// Redeem a matured position and buy PT of another market
    Rollover {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long)]
        chain: String,

        /// Matured market address
        #[arg(long)]
        from: String,

        /// Target market address
        #[arg(long)]
        to: String,
    },

    /// Claim YT rewards, swap them to the underlying and buy PT
    Compound {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long)]
        chain: String,

        #[arg(long)]
        market: String,
    },

    /// Claim rewards and exit every open position
    Unwind {
        #[command(flatten)]
        run: RunArgs,

        /// Chain ids to unwind (repeatable)
        #[arg(long = "chain", required = true)]
        chain_ids: Vec<String>,

        /// Override execution.unwind_concurrency
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

/// Arguments shared by every strategy command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Wallet that holds the positions
    #[arg(long, env = "YIELDEX_WALLET")]
    pub wallet: String,

    /// plan (no submission) or execute
    #[arg(long, default_value = "plan")]
    pub mode: ExecutionMode,

    /// Override execution.max_retries
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Override execution.slippage (fraction, 0.005 = 0.5%)
    #[arg(long)]
    pub slippage: Option<Decimal>,

    /// Override execution.call_timeout_ms for every planning and submission call
    #[arg(long)]
    pub call_timeout_ms: Option<u64>,

    /// JSON file with a pre-signed delegation bundle
    #[arg(long)]
    pub delegation_bundle: Option<PathBuf>,
}
