//! Command handlers: resolve markets and positions, run the strategy, print
//! the outcome.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::adapters::{HttpActionsClient, OnchainActionsClient, RelayerClient};
use crate::config::AppConfig;
use crate::coordination::CancelToken;
use crate::domain::{
    CompoundRequest, DelegationBundle, ExecutionOutcome, InitialDepositRequest, Market, Position,
    RebalanceRequest, RolloverRequest, StrategyConfig, TokenAmount, TokenIdentity, TokenUid,
    UnwindRequest,
};
use crate::error::ExecError;
use crate::strategy::{PositionScanner, RetryPolicy, StrategyRunner};

use super::{Cli, Commands, RunArgs};

/// Collaborators shared by one CLI invocation
pub struct CliContext {
    config: AppConfig,
    actions: Arc<HttpActionsClient>,
    relayer: Arc<RelayerClient>,
    cancel: CancelToken,
    json: bool,
}

impl CliContext {
    pub fn new(config: AppConfig, cancel: CancelToken, json: bool) -> Result<Self> {
        let actions = HttpActionsClient::new(&config.actions)
            .context("failed to build onchain actions client")?;
        let relayer =
            RelayerClient::new(&config.relayer).context("failed to build relayer client")?;

        Ok(Self {
            config,
            actions: Arc::new(actions),
            relayer: Arc::new(relayer),
            cancel,
            json,
        })
    }

    fn scanner(&self) -> PositionScanner {
        let actions: Arc<dyn OnchainActionsClient> = self.actions.clone();
        PositionScanner::new(actions, RetryPolicy::new(self.config.execution.max_retries))
    }

    fn runner(&self) -> StrategyRunner {
        StrategyRunner::new(self.actions.clone(), self.relayer.clone())
            .with_delegated_executor(self.relayer.clone())
            .with_cancel_token(self.cancel.clone())
            .with_unwind_concurrency(self.config.execution.unwind_concurrency)
    }

    fn strategy_config(&self, args: &RunArgs) -> Result<StrategyConfig> {
        let mut config =
            StrategyConfig::from_execution(&args.wallet, args.mode, &self.config.execution);
        if let Some(max_retries) = args.max_retries {
            config = config.with_max_retries(max_retries);
        }
        if let Some(slippage) = args.slippage {
            config = config.with_slippage(slippage);
        }
        if let Some(timeout_ms) = args.call_timeout_ms {
            config = config.with_call_timeout_ms(timeout_ms);
        }
        if let Some(path) = &args.delegation_bundle {
            config = config.with_delegation_bundle(load_delegation_bundle(path)?);
        }
        Ok(config)
    }

    async fn market(&self, chain: &str, address: &str) -> Result<Market> {
        let id = TokenUid::new(chain, address);
        let mut markets = self.scanner().markets(&[chain.to_string()]).await?;
        markets
            .remove(&id)
            .ok_or_else(|| ExecError::MarketNotFound(id.to_string()).into())
    }

    async fn position(&self, config: &StrategyConfig, market: &Market) -> Result<Position> {
        let positions = self
            .scanner()
            .scan(
                &config.wallet_address,
                &[market.market_identifier.chain_id.clone()],
                config.position_lookup_attempts,
                config.position_lookup_delay_ms,
            )
            .await?;

        positions
            .into_iter()
            .find(|p| p.market_id() == market.id())
            .ok_or_else(|| {
                ExecError::Validation(format!(
                    "{} holds no position in {}",
                    config.wallet_address,
                    market.label()
                ))
                .into()
            })
    }

    fn print_outcome(&self, strategy: &str, outcome: &ExecutionOutcome) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(outcome)?);
            return Ok(());
        }

        println!("{strategy}:");
        println!("  positions:    {}", outcome.position_count);
        println!("  transactions: {}", outcome.transaction_count);
        println!("  submitted:    {}", outcome.submitted());
        for hash in &outcome.tx_hashes {
            println!("    {hash}");
        }
        for failure in &outcome.failures {
            println!("  FAILED {failure}");
        }
        Ok(())
    }
}

fn load_delegation_bundle(path: &Path) -> Result<DelegationBundle> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read delegation bundle {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid delegation bundle {}", path.display()))
}

/// Load configuration from `--config-dir`
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    AppConfig::load_from(&cli.config_dir)
        .with_context(|| format!("failed to load config from {}", cli.config_dir.display()))
}

/// Dispatch one parsed command
pub async fn run(cli: Cli, ctx: CliContext) -> Result<()> {
    match cli.command {
        Commands::Markets { chain_ids } => {
            let mut markets: Vec<Market> =
                ctx.scanner().markets(&chain_ids).await?.into_values().collect();
            markets.sort_by(|a, b| a.expiry.cmp(&b.expiry));

            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&markets)?);
            } else {
                let now = chrono::Utc::now();
                for market in &markets {
                    println!(
                        "{:<44} {:<16} expiry {} {}",
                        market.market_identifier.to_string(),
                        market.label(),
                        market.expiry.format("%Y-%m-%d"),
                        if market.is_matured(now) { "(matured)" } else { "" }
                    );
                }
            }
        }

        Commands::Positions { wallet, chain_ids } => {
            let config = StrategyConfig::from_execution(
                &wallet,
                Default::default(),
                &ctx.config.execution,
            );
            config.validate()?;
            let positions = ctx
                .scanner()
                .scan(
                    &config.wallet_address,
                    &chain_ids,
                    config.position_lookup_attempts,
                    config.position_lookup_delay_ms,
                )
                .await?;

            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&positions)?);
            } else if positions.is_empty() {
                println!("no open positions");
            } else {
                for position in &positions {
                    let rewards: Vec<String> =
                        position.claimable_rewards().map(|r| r.to_string()).collect();
                    println!(
                        "{:<44} pt {:<24} rewards [{}]",
                        position.market_id().to_string(),
                        position.pt.to_string(),
                        rewards.join(", ")
                    );
                }
            }
        }

        Commands::Deposit {
            run,
            chain,
            market,
            amount,
            token,
            decimals,
        } => {
            let config = ctx.strategy_config(&run)?;
            let target_market = ctx.market(&chain, &market).await?;
            let funding_token = match token {
                Some(address) => {
                    let uid = TokenUid::new(&chain, &address);
                    if uid == target_market.underlying_token.token_uid {
                        target_market.underlying_token.clone()
                    } else {
                        TokenIdentity::new(uid, address, decimals)
                    }
                }
                None => target_market.underlying_token.clone(),
            };

            info!(market = %target_market.label(), funding = %funding_token.symbol, "deposit");
            let outcome = ctx
                .runner()
                .execute_initial_deposit(InitialDepositRequest {
                    config,
                    target_market,
                    funding: TokenAmount::new(funding_token, amount),
                })
                .await?;
            ctx.print_outcome("deposit", &outcome)?;
        }

        Commands::Rebalance {
            run,
            chain,
            from,
            to,
        } => {
            let config = ctx.strategy_config(&run)?;
            let current_market = ctx.market(&chain, &from).await?;
            let target_market = ctx.market(&chain, &to).await?;
            let position = ctx.position(&config, &current_market).await?;

            let outcome = ctx
                .runner()
                .execute_rebalance(RebalanceRequest {
                    config,
                    current_market,
                    target_market,
                    position,
                })
                .await?;
            ctx.print_outcome("rebalance", &outcome)?;
        }

        Commands::Rollover {
            run,
            chain,
            from,
            to,
        } => {
            let config = ctx.strategy_config(&run)?;
            let current_market = ctx.market(&chain, &from).await?;
            let target_market = ctx.market(&chain, &to).await?;
            let position = ctx.position(&config, &current_market).await?;

            let outcome = ctx
                .runner()
                .execute_rollover(RolloverRequest {
                    config,
                    current_market,
                    target_market,
                    position,
                })
                .await?;
            ctx.print_outcome("rollover", &outcome)?;
        }

        Commands::Compound { run, chain, market } => {
            let config = ctx.strategy_config(&run)?;
            let market = ctx.market(&chain, &market).await?;
            let position = ctx.position(&config, &market).await?;

            let outcome = ctx
                .runner()
                .execute_compound(CompoundRequest {
                    config,
                    market,
                    position,
                })
                .await?;
            ctx.print_outcome("compound", &outcome)?;
        }

        Commands::Unwind {
            run,
            chain_ids,
            concurrency,
        } => {
            let config = ctx.strategy_config(&run)?;
            let mut runner = ctx.runner();
            if let Some(concurrency) = concurrency {
                runner = runner.with_unwind_concurrency(concurrency);
            }

            let outcome = runner
                .execute_unwind(UnwindRequest { config, chain_ids })
                .await?;
            ctx.print_outcome("unwind", &outcome)?;
            if outcome.has_failures() {
                anyhow::bail!("{} position(s) failed to unwind", outcome.failures.len());
            }
        }
    }

    Ok(())
}
