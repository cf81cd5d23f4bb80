pub mod adapters;
pub mod cli;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod error;
pub mod strategy;

pub use adapters::{
    DelegatedExecutor, HttpActionsClient, OnchainActionsClient, RelayerClient, TransactionExecutor,
};
pub use config::AppConfig;
pub use coordination::CancelToken;
pub use domain::{
    CompoundRequest, ExecutionMode, ExecutionOutcome, InitialDepositRequest, Market, Position,
    PositionFailure, RebalanceRequest, RolloverRequest, StrategyConfig, TokenAmount,
    TokenIdentity, TokenUid, UnwindRequest,
};
pub use error::{ExecError, Result};
pub use strategy::{PositionScanner, RetryPolicy, StrategyRunner};
