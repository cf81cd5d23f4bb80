//! Deterministic collaborators for strategy flow tests.
//!
//! `FakeActions` answers planning calls from a fixed market table and records
//! every call in order, so tests can assert on call order and on the exact
//! parameters passed between dependent steps.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use yieldex::adapters::{
    BuyPtRequest, BuyPtResponse, ClaimRewardsRequest, ClaimRewardsResponse, DelegatedExecutor,
    ExitPtResponse, ListMarketsRequest, ListMarketsResponse, ListPositionsRequest,
    ListPositionsResponse, OnchainActionsClient, RedeemPtRequest, SellPtRequest, SwapRequest,
    SwapResponse, TransactionExecutor,
};
use yieldex::domain::{
    DelegatedExecution, DelegationBundle, Market, Position, TokenAmount, TokenIdentity, TokenUid,
    TransactionRequest, TxReceipt, YieldHolding,
};
use yieldex::error::{ExecError, Result};

pub const CHAIN: &str = "42161";
pub const WALLET: &str = "0x00000000000000000000000000000000000000aa";

pub fn token(address: &str, symbol: &str) -> TokenIdentity {
    TokenIdentity::new(TokenUid::new(CHAIN, address), symbol, 6)
}

pub fn usdc() -> TokenIdentity {
    token("0x000000000000000000000000000000000000usdc", "USDC")
}

pub fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap()
}

/// `2026-02-09T00:00:00Z`, the fixed clock for maturity decisions
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 9, 0, 0, 0).unwrap()
}

/// A USDC market named after `tag`, with PT/YT addresses derived from it
pub fn market(tag: &str, expiry: DateTime<Utc>) -> Market {
    Market {
        market_identifier: TokenUid::new(CHAIN, &format!("0xmarket{tag}")),
        expiry,
        pt_token: token(&format!("0xpt{tag}"), &format!("PT-{tag}")),
        yt_token: token(&format!("0xyt{tag}"), &format!("YT-{tag}")),
        underlying_token: usdc(),
        name: format!("USDC-{tag}"),
    }
}

pub fn position(market: &Market, pt_amount: Decimal, rewards: Vec<TokenAmount>) -> Position {
    Position {
        market_identifier: market.market_identifier.clone(),
        pt: TokenAmount::new(market.pt_token.clone(), pt_amount),
        yt: YieldHolding {
            token: market.yt_token.clone(),
            amount: pt_amount,
            claimable_rewards: rewards,
        },
    }
}

pub fn delegation_bundle() -> DelegationBundle {
    DelegationBundle {
        delegator_address: WALLET.to_string(),
        delegate_address: "0x00000000000000000000000000000000000000bb".to_string(),
        delegations: vec![serde_json::json!({ "caveats": [] })],
    }
}

fn tx(to: &str, selector: &str) -> TransactionRequest {
    TransactionRequest::new(CHAIN, to, selector, "0")
}

fn amount(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap()
}

/// One recorded planning or listing call
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCall {
    BuyPt(BuyPtRequest),
    SellPt(SellPtRequest),
    RedeemPt(RedeemPtRequest),
    ClaimRewards(ClaimRewardsRequest),
    Swap(SwapRequest),
    ListMarkets,
    ListPositions,
}

impl ActionCall {
    pub fn name(&self) -> &'static str {
        match self {
            ActionCall::BuyPt(_) => "buyPt",
            ActionCall::SellPt(_) => "sellPt",
            ActionCall::RedeemPt(_) => "redeemPt",
            ActionCall::ClaimRewards(_) => "claimRewards",
            ActionCall::Swap(_) => "swap",
            ActionCall::ListMarkets => "listMarkets",
            ActionCall::ListPositions => "listPositions",
        }
    }
}

/// Scripted actions API.
///
/// - sell quotes 98% of the PT amount in the market's underlying
/// - redeem quotes 1:1 in the underlying
/// - buy quotes 1:1 PT out
/// - swap quotes from `swap_quotes`, defaulting to the input amount
pub struct FakeActions {
    markets: Vec<Market>,
    listings: Mutex<VecDeque<Vec<Position>>>,
    swap_quotes: HashMap<TokenUid, Decimal>,
    failing_pt: HashSet<TokenUid>,
    failing_yt: HashSet<TokenUid>,
    transient_failures: Mutex<HashMap<&'static str, u32>>,
    calls: Mutex<Vec<ActionCall>>,
}

impl FakeActions {
    pub fn new(markets: Vec<Market>) -> Self {
        Self {
            markets,
            listings: Mutex::new(VecDeque::new()),
            swap_quotes: HashMap::new(),
            failing_pt: HashSet::new(),
            failing_yt: HashSet::new(),
            transient_failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Successive position listings; the last one repeats
    pub fn with_listings(self, listings: Vec<Vec<Position>>) -> Self {
        *self.listings.lock().unwrap() = listings.into();
        self
    }

    pub fn with_swap_quote(mut self, from: &TokenIdentity, to_amount: Decimal) -> Self {
        self.swap_quotes.insert(from.token_uid.clone(), to_amount);
        self
    }

    /// Every sell or redeem of this PT is rejected
    pub fn with_failing_exit(mut self, pt: &TokenIdentity) -> Self {
        self.failing_pt.insert(pt.token_uid.clone());
        self
    }

    /// Every claim on this YT is rejected
    pub fn with_failing_claim(mut self, yt: &TokenIdentity) -> Self {
        self.failing_yt.insert(yt.token_uid.clone());
        self
    }

    /// The next `times` calls of `step` are rejected, later ones succeed
    pub fn with_transient_failures(self, step: &'static str, times: u32) -> Self {
        self.transient_failures.lock().unwrap().insert(step, times);
        self
    }

    pub fn calls(&self) -> Vec<ActionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(ActionCall::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.name() == name).count()
    }

    fn record(&self, call: ActionCall) -> Result<()> {
        let name = call.name();
        self.calls.lock().unwrap().push(call);

        let mut failures = self.transient_failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ExecError::Upstream(format!("{name}: transient upstream error")));
            }
        }
        Ok(())
    }

    fn market_for_pt(&self, pt: &TokenUid) -> Result<&Market> {
        self.markets
            .iter()
            .find(|m| &m.pt_token.token_uid == pt)
            .ok_or_else(|| ExecError::Upstream(format!("unknown PT {pt}")))
    }

    fn exit(&self, pt: &TokenUid, raw_amount: &str, rate: Decimal) -> Result<ExitPtResponse> {
        if self.failing_pt.contains(pt) {
            return Err(ExecError::Upstream(format!("no liquidity for {pt}")));
        }
        let market = self.market_for_pt(pt)?;
        Ok(ExitPtResponse {
            exact_amount_out: amount(raw_amount) * rate,
            token_out: market.underlying_token.clone(),
            transactions: vec![
                tx(&market.pt_token.token_uid.address, "0x095EA7B3"),
                tx(&market.market_identifier.address, "0xEXIT"),
            ],
        })
    }
}

#[async_trait]
impl OnchainActionsClient for FakeActions {
    async fn create_tokenized_yield_buy_pt(&self, request: &BuyPtRequest) -> Result<BuyPtResponse> {
        self.record(ActionCall::BuyPt(request.clone()))?;
        Ok(BuyPtResponse {
            exact_pt_amount_out: Some(amount(&request.amount)),
            transactions: vec![
                tx(&request.input_token_uid.address, "0x095ea7b3"),
                tx(&request.market_address, "0xbuy"),
            ],
        })
    }

    async fn create_tokenized_yield_sell_pt(&self, request: &SellPtRequest) -> Result<ExitPtResponse> {
        self.record(ActionCall::SellPt(request.clone()))?;
        self.exit(&request.pt_token_uid, &request.amount, Decimal::new(98, 2))
    }

    async fn create_tokenized_yield_redeem_pt(
        &self,
        request: &RedeemPtRequest,
    ) -> Result<ExitPtResponse> {
        self.record(ActionCall::RedeemPt(request.clone()))?;
        self.exit(&request.pt_token_uid, &request.amount, Decimal::ONE)
    }

    async fn create_tokenized_yield_claim_rewards(
        &self,
        request: &ClaimRewardsRequest,
    ) -> Result<ClaimRewardsResponse> {
        self.record(ActionCall::ClaimRewards(request.clone()))?;
        if self.failing_yt.contains(&request.yt_token_uid) {
            return Err(ExecError::Upstream(format!("claim reverted for {}", request.yt_token_uid)));
        }
        Ok(ClaimRewardsResponse {
            transactions: vec![tx(&request.yt_token_uid.address, "0xclaim")],
        })
    }

    async fn create_swap(&self, request: &SwapRequest) -> Result<SwapResponse> {
        self.record(ActionCall::Swap(request.clone()))?;
        let from_amount = amount(&request.amount);
        let to_amount = self
            .swap_quotes
            .get(&request.from_token_uid)
            .copied()
            .unwrap_or(from_amount);
        let to_token = self
            .markets
            .iter()
            .map(|m| &m.underlying_token)
            .find(|t| t.token_uid == request.to_token_uid)
            .cloned()
            .ok_or_else(|| ExecError::Upstream("unknown swap target".into()))?;

        Ok(SwapResponse {
            exact_from_amount: from_amount,
            exact_to_amount: to_amount,
            from_token: TokenIdentity::new(request.from_token_uid.clone(), "REWARD", 18),
            to_token,
            transactions: vec![tx("0x00000000000000000000000000000000000000ff", "0xswap")],
        })
    }

    async fn list_tokenized_yield_markets(
        &self,
        _request: &ListMarketsRequest,
    ) -> Result<ListMarketsResponse> {
        self.record(ActionCall::ListMarkets)?;
        Ok(ListMarketsResponse {
            markets: self.markets.clone(),
        })
    }

    async fn list_tokenized_yield_positions(
        &self,
        _request: &ListPositionsRequest,
    ) -> Result<ListPositionsResponse> {
        self.record(ActionCall::ListPositions)?;
        let mut listings = self.listings.lock().unwrap();
        let positions = if listings.len() > 1 {
            listings.pop_front().unwrap_or_default()
        } else {
            listings.front().cloned().unwrap_or_default()
        };
        Ok(ListPositionsResponse { positions })
    }
}

/// Executor that confirms every transaction with a sequential hash
#[derive(Default)]
pub struct FakeExecutor {
    attempts: Mutex<Vec<String>>,
    submitted: Mutex<Vec<(TransactionRequest, String)>>,
    failures_left: AtomicUsize,
    always_fail: bool,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `times` submissions
    pub fn failing_first(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<(TransactionRequest, String)> {
        self.submitted.lock().unwrap().clone()
    }

    /// Idempotency keys of every attempt, failed ones included
    pub fn attempt_keys(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl TransactionExecutor for FakeExecutor {
    async fn execute_transaction(
        &self,
        tx: &TransactionRequest,
        idempotency_key: &str,
    ) -> Result<TxReceipt> {
        self.attempts.lock().unwrap().push(idempotency_key.to_string());
        if self.always_fail {
            return Err(ExecError::Upstream("nonce too low".into()));
        }
        let pending_failure = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if pending_failure {
            return Err(ExecError::Upstream("replacement transaction underpriced".into()));
        }

        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((tx.clone(), idempotency_key.to_string()));
        Ok(TxReceipt {
            transaction_hash: format!("0x{:064x}", submitted.len()),
        })
    }
}

/// Delegated executor that confirms each batch with one hash per transaction
#[derive(Default)]
pub struct FakeDelegated {
    batches: Mutex<Vec<Vec<TransactionRequest>>>,
}

impl FakeDelegated {
    pub fn batches(&self) -> Vec<Vec<TransactionRequest>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl DelegatedExecutor for FakeDelegated {
    async fn redeem_delegations_and_execute_transactions(
        &self,
        _bundle: &DelegationBundle,
        transactions: &[TransactionRequest],
    ) -> Result<DelegatedExecution> {
        let mut batches = self.batches.lock().unwrap();
        batches.push(transactions.to_vec());
        let batch = batches.len();
        Ok(DelegatedExecution {
            tx_hashes: (0..transactions.len())
                .map(|i| format!("0xd{batch:031x}{i:032x}"))
                .collect(),
            receipts: vec![],
        })
    }
}
