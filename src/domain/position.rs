use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MarketId, TokenAmount, TokenIdentity};

/// Yield-token holding plus the rewards it has accrued
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldHolding {
    pub token: TokenIdentity,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub claimable_rewards: Vec<TokenAmount>,
}

/// Snapshot of one held tokenized-yield position, as returned by a scan.
///
/// Never mutated; a fresh scan produces fresh positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub market_identifier: MarketId,
    pub pt: TokenAmount,
    pub yt: YieldHolding,
}

impl Position {
    pub fn market_id(&self) -> &MarketId {
        &self.market_identifier
    }

    pub fn has_principal(&self) -> bool {
        self.pt.is_positive()
    }

    pub fn has_claimable_rewards(&self) -> bool {
        self.yt.claimable_rewards.iter().any(TokenAmount::is_positive)
    }

    /// Rewards with a positive balance
    pub fn claimable_rewards(&self) -> impl Iterator<Item = &TokenAmount> {
        self.yt.claimable_rewards.iter().filter(|r| r.is_positive())
    }

    /// Nothing to claim and nothing to exit
    pub fn is_empty(&self) -> bool {
        !self.has_principal() && !self.has_claimable_rewards()
    }
}
