pub mod executor;
pub mod onchain_actions;

pub use executor::{DelegatedExecutor, RelayerClient, TransactionExecutor};
pub use onchain_actions::{
    BuyPtRequest, BuyPtResponse, ClaimRewardsRequest, ClaimRewardsResponse, ExitPtResponse,
    HasTransactions, HttpActionsClient, ListMarketsRequest, ListMarketsResponse,
    ListPositionsRequest, ListPositionsResponse, OnchainActionsClient, RedeemPtRequest,
    RedeemPtResponse, SellPtRequest, SellPtResponse, SwapRequest, SwapResponse,
};
