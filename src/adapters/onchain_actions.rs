//! Onchain actions API client
//!
//! The actions API turns a strategy intent (buy PT, sell PT, redeem, claim, swap)
//! into unsigned transactions, and lists markets and wallet positions.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::ActionsApiConfig;
use crate::domain::{Market, Position, TokenIdentity, TokenUid, TransactionPlan, TransactionRequest};
use crate::error::{ExecError, Result};

// ==================== Requests ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyPtRequest {
    pub wallet_address: String,
    pub market_address: String,
    pub input_token_uid: TokenUid,
    /// Decimal string
    pub amount: String,
    /// Decimal string, fraction
    pub slippage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellPtRequest {
    pub wallet_address: String,
    pub pt_token_uid: TokenUid,
    pub amount: String,
    pub slippage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPtRequest {
    pub wallet_address: String,
    pub pt_token_uid: TokenUid,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRewardsRequest {
    pub wallet_address: String,
    pub yt_token_uid: TokenUid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub wallet_address: String,
    pub amount: String,
    /// Always "exactIn": `amount` is what we spend
    pub amount_type: String,
    pub from_token_uid: TokenUid,
    pub to_token_uid: TokenUid,
    pub slippage_tolerance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMarketsRequest {
    pub chain_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPositionsRequest {
    pub wallet_address: String,
    pub chain_ids: Vec<String>,
}

// ==================== Responses ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyPtResponse {
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub exact_pt_amount_out: Option<Decimal>,
    pub transactions: Vec<TransactionRequest>,
}

/// Shared shape of sell and redeem responses
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitPtResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub exact_amount_out: Decimal,
    pub token_out: TokenIdentity,
    pub transactions: Vec<TransactionRequest>,
}

pub type SellPtResponse = ExitPtResponse;
pub type RedeemPtResponse = ExitPtResponse;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRewardsResponse {
    pub transactions: Vec<TransactionRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub exact_from_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub exact_to_amount: Decimal,
    pub from_token: TokenIdentity,
    pub to_token: TokenIdentity,
    pub transactions: Vec<TransactionRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMarketsResponse {
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPositionsResponse {
    pub positions: Vec<Position>,
}

/// Extract the transaction plan from any planning response
pub trait HasTransactions {
    fn transaction_plan(&self) -> TransactionPlan;
}

macro_rules! impl_has_transactions {
    ($($ty:ty),* $(,)?) => {
        $(impl HasTransactions for $ty {
            fn transaction_plan(&self) -> TransactionPlan {
                TransactionPlan::new(self.transactions.clone())
            }
        })*
    };
}

impl_has_transactions!(BuyPtResponse, ExitPtResponse, ClaimRewardsResponse, SwapResponse);

// ==================== Client trait ====================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OnchainActionsClient: Send + Sync {
    async fn create_tokenized_yield_buy_pt(&self, request: &BuyPtRequest) -> Result<BuyPtResponse>;

    async fn create_tokenized_yield_sell_pt(&self, request: &SellPtRequest) -> Result<SellPtResponse>;

    async fn create_tokenized_yield_redeem_pt(
        &self,
        request: &RedeemPtRequest,
    ) -> Result<RedeemPtResponse>;

    async fn create_tokenized_yield_claim_rewards(
        &self,
        request: &ClaimRewardsRequest,
    ) -> Result<ClaimRewardsResponse>;

    async fn create_swap(&self, request: &SwapRequest) -> Result<SwapResponse>;

    async fn list_tokenized_yield_markets(
        &self,
        request: &ListMarketsRequest,
    ) -> Result<ListMarketsResponse>;

    async fn list_tokenized_yield_positions(
        &self,
        request: &ListPositionsRequest,
    ) -> Result<ListPositionsResponse>;
}

// ==================== HTTP implementation ====================

/// reqwest-backed client for the actions API
#[derive(Clone)]
pub struct HttpActionsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpActionsClient {
    pub fn new(config: &ActionsApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST actions API");

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, %status, "actions API rejected request");
            return Err(ExecError::Upstream(format!("{path} returned HTTP {status}: {body}")));
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl OnchainActionsClient for HttpActionsClient {
    #[instrument(skip(self, request), fields(market = %request.market_address))]
    async fn create_tokenized_yield_buy_pt(&self, request: &BuyPtRequest) -> Result<BuyPtResponse> {
        self.post("/tokenized-yield/buy-pt", request).await
    }

    #[instrument(skip(self, request), fields(pt = %request.pt_token_uid))]
    async fn create_tokenized_yield_sell_pt(&self, request: &SellPtRequest) -> Result<SellPtResponse> {
        self.post("/tokenized-yield/sell-pt", request).await
    }

    #[instrument(skip(self, request), fields(pt = %request.pt_token_uid))]
    async fn create_tokenized_yield_redeem_pt(
        &self,
        request: &RedeemPtRequest,
    ) -> Result<RedeemPtResponse> {
        self.post("/tokenized-yield/redeem-pt", request).await
    }

    #[instrument(skip(self, request), fields(yt = %request.yt_token_uid))]
    async fn create_tokenized_yield_claim_rewards(
        &self,
        request: &ClaimRewardsRequest,
    ) -> Result<ClaimRewardsResponse> {
        self.post("/tokenized-yield/claim-rewards", request).await
    }

    #[instrument(skip(self, request), fields(from = %request.from_token_uid, to = %request.to_token_uid))]
    async fn create_swap(&self, request: &SwapRequest) -> Result<SwapResponse> {
        self.post("/swap", request).await
    }

    async fn list_tokenized_yield_markets(
        &self,
        request: &ListMarketsRequest,
    ) -> Result<ListMarketsResponse> {
        self.post("/tokenized-yield/markets", request).await
    }

    async fn list_tokenized_yield_positions(
        &self,
        request: &ListPositionsRequest,
    ) -> Result<ListPositionsResponse> {
        self.post("/tokenized-yield/positions", request).await
    }
}
