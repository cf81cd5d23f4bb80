use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Chain-qualified token address, used as the join key between markets,
/// positions and planned transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawTokenUid")]
pub struct TokenUid {
    pub chain_id: String,
    pub address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenUid {
    chain_id: String,
    address: String,
}

impl From<RawTokenUid> for TokenUid {
    fn from(raw: RawTokenUid) -> Self {
        TokenUid::new(raw.chain_id, raw.address)
    }
}

impl TokenUid {
    /// Build a uid, normalizing the address to lowercase
    pub fn new(chain_id: impl Into<String>, address: impl AsRef<str>) -> Self {
        Self {
            chain_id: chain_id.into().trim().to_string(),
            address: normalize_hex(address.as_ref()),
        }
    }
}

impl std::fmt::Display for TokenUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.address)
    }
}

/// Markets are identified the same way tokens are: chain id + contract address.
pub type MarketId = TokenUid;

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdentity {
    pub token_uid: TokenUid,
    pub symbol: String,
    pub decimals: u32,
    #[serde(default)]
    pub name: String,
}

impl TokenIdentity {
    pub fn new(token_uid: TokenUid, symbol: impl Into<String>, decimals: u32) -> Self {
        let symbol = symbol.into();
        Self {
            token_uid,
            name: symbol.clone(),
            symbol,
            decimals,
        }
    }

    pub fn is_same_token(&self, other: &TokenIdentity) -> bool {
        self.token_uid == other.token_uid
    }
}

/// A token together with an exact amount of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    pub token: TokenIdentity,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

impl TokenAmount {
    pub fn new(token: TokenIdentity, amount: Decimal) -> Self {
        Self { token, amount }
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", format_amount(self.amount), self.token.symbol)
    }
}

/// Render an amount as the decimal string the actions API expects
/// (no exponent, no trailing zeros).
pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Lowercase a hex address or calldata blob.
pub fn normalize_hex(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Check that a string looks like a 20-byte 0x-prefixed address.
pub fn is_valid_address(raw: &str) -> bool {
    let raw = raw.trim();
    let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) else {
        return false;
    };
    hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
}
