use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MarketId, TokenIdentity};

/// A tokenized-yield market (principal token + yield token over one underlying)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub market_identifier: MarketId,
    pub expiry: DateTime<Utc>,
    pub pt_token: TokenIdentity,
    pub yt_token: TokenIdentity,
    pub underlying_token: TokenIdentity,
    #[serde(default)]
    pub name: String,
}

impl Market {
    pub fn id(&self) -> &MarketId {
        &self.market_identifier
    }

    /// A market is matured once `now` reaches its expiry; PT can then be redeemed 1:1.
    pub fn is_matured(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }

    /// Seconds until expiry (zero once matured)
    pub fn seconds_to_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry - now).num_seconds().max(0)
    }

    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.pt_token.symbol
        } else {
            &self.name
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) expiry {}",
            self.label(),
            self.market_identifier,
            self.expiry.format("%Y-%m-%d")
        )
    }
}
