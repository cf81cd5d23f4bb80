//! Position discovery for unwind
//!
//! The positions listing is eventually consistent: right after a deposit it
//! can come back empty. An empty listing is polled again, never treated as an
//! error; whatever the last poll returns is the answer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::adapters::{ListMarketsRequest, ListPositionsRequest, OnchainActionsClient};
use crate::domain::{Market, MarketId, Position};
use crate::error::Result;

use super::retry::{PollPolicy, RetryPolicy};

pub struct PositionScanner {
    client: Arc<dyn OnchainActionsClient>,
    retry: RetryPolicy,
}

impl PositionScanner {
    pub fn new(client: Arc<dyn OnchainActionsClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// List open positions, polling up to `attempts` times while the listing is empty.
    ///
    /// Each listing call is retried on error. Positions with neither principal
    /// nor claimable rewards are dropped.
    pub async fn scan(
        &self,
        wallet_address: &str,
        chain_ids: &[String],
        attempts: u32,
        delay_ms: u64,
    ) -> Result<Vec<Position>> {
        let request = ListPositionsRequest {
            wallet_address: wallet_address.to_string(),
            chain_ids: chain_ids.to_vec(),
        };
        let poll = PollPolicy::new(attempts, Duration::from_millis(delay_ms));
        let (client, retry, request) = (&self.client, &self.retry, &request);

        let response = poll
            .poll(
                "listTokenizedYieldPositions",
                move || {
                    retry.run("listTokenizedYieldPositions", move || {
                        client.list_tokenized_yield_positions(request)
                    })
                },
                |resp| !resp.positions.is_empty(),
            )
            .await?;

        let total = response.positions.len();
        let positions: Vec<Position> = response
            .positions
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();

        info!(
            wallet = wallet_address,
            found = total,
            open = positions.len(),
            "position scan complete"
        );
        Ok(positions)
    }

    /// Market metadata keyed by market id; fetched once per run
    pub async fn markets(&self, chain_ids: &[String]) -> Result<HashMap<MarketId, Market>> {
        let request = ListMarketsRequest {
            chain_ids: chain_ids.to_vec(),
        };

        let response = self
            .retry
            .run("listTokenizedYieldMarkets", || {
                self.client.list_tokenized_yield_markets(&request)
            })
            .await?;

        debug!(markets = response.markets.len(), "loaded market metadata");
        Ok(response
            .markets
            .into_iter()
            .map(|m| (m.market_identifier.clone(), m))
            .collect())
    }
}
