//! Canonical trade records and their content-addressed identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::id::Address;

/// A swap event reduced to the fields the competition cares about.
///
/// Amounts are whole contest units (raw divided by 10^decimals,
/// truncating). `is_buy` and `is_sell` record whether native coin flowed
/// into and out of the pool; they are computed independently from the raw
/// event, so both can be false (the event touches no ledger) and in
/// degenerate pool shapes both can be true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTrade {
    /// Counterparty wallet in canonical user-friendly form.
    pub wallet: Address,
    /// Jetton master address the contest tracks.
    pub token: Address,
    /// Human-readable jetton name, as reported by the indexer.
    pub token_name: String,
    /// Jetton ticker symbol.
    pub token_symbol: String,
    /// Decimal places the jetton's raw amounts were scaled by.
    pub token_decimals: i64,
    /// Native (TON) side of the swap, whole units.
    pub native_amount: u64,
    /// Jetton side of the swap, whole units.
    pub token_amount: u64,
    /// Native coin flowed into the pool.
    pub is_buy: bool,
    /// Native coin flowed out of the pool.
    pub is_sell: bool,
}

impl NormalizedTrade {
    /// Build a purchase record.
    #[must_use]
    pub fn buy(
        wallet: impl Into<Address>,
        token: impl Into<Address>,
        native_amount: u64,
        token_amount: u64,
    ) -> Self {
        Self {
            wallet: wallet.into(),
            token: token.into(),
            token_name: String::new(),
            token_symbol: String::new(),
            token_decimals: 9,
            native_amount,
            token_amount,
            is_buy: true,
            is_sell: false,
        }
    }

    /// Build a sale record.
    #[must_use]
    pub fn sell(
        wallet: impl Into<Address>,
        token: impl Into<Address>,
        native_amount: u64,
        token_amount: u64,
    ) -> Self {
        Self {
            wallet: wallet.into(),
            token: token.into(),
            token_name: String::new(),
            token_symbol: String::new(),
            token_decimals: 9,
            native_amount,
            token_amount,
            is_buy: false,
            is_sell: true,
        }
    }

    /// Build a record for an event that is neither a buy nor a sell.
    #[must_use]
    pub fn unclassified(wallet: impl Into<Address>, token: impl Into<Address>) -> Self {
        Self {
            wallet: wallet.into(),
            token: token.into(),
            token_name: String::new(),
            token_symbol: String::new(),
            token_decimals: 9,
            native_amount: 0,
            token_amount: 0,
            is_buy: false,
            is_sell: false,
        }
    }

    /// Attach the jetton metadata reported alongside the raw event.
    #[must_use]
    pub fn with_token_meta(
        mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: i64,
    ) -> Self {
        self.token_name = name.into();
        self.token_symbol = symbol.into();
        self.token_decimals = decimals;
        self
    }

    /// Content hash over the canonical byte serialization.
    ///
    /// Equal trades hash equal; changing any field changes the hash. Field
    /// order is fixed, string fields are NUL-delimited, integers are
    /// big-endian.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        hasher.update(self.wallet.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.token.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.token_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.token_symbol.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.token_decimals.to_be_bytes());
        hasher.update(self.native_amount.to_be_bytes());
        hasher.update(self.token_amount.to_be_bytes());
        hasher.update([u8::from(self.is_buy), u8::from(self.is_sell)]);
        ContentHash(hasher.finalize().into())
    }
}

/// SHA-256 digest identifying a [`NormalizedTrade`] by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Lowercase hex rendering, as stored and logged.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hash back from its hex rendering.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_buy() -> NormalizedTrade {
        NormalizedTrade::buy("EQBuyerWallet", "EQJettonMaster", 25, 120_000)
            .with_token_meta("Kilo", "KILO", 6)
    }

    #[test]
    fn test_equal_trades_hash_equal() {
        assert_eq!(sample_buy().content_hash(), sample_buy().content_hash());
    }

    #[test]
    fn test_every_field_feeds_the_hash() {
        let base = sample_buy();
        let mut other = base.clone();
        other.wallet = Address::new("EQOtherWallet");
        assert_ne!(base.content_hash(), other.content_hash());

        let mut other = base.clone();
        other.token = Address::new("EQOtherJetton");
        assert_ne!(base.content_hash(), other.content_hash());

        let mut other = base.clone();
        other.token_name = "Mega".into();
        assert_ne!(base.content_hash(), other.content_hash());

        let mut other = base.clone();
        other.token_symbol = "MEGA".into();
        assert_ne!(base.content_hash(), other.content_hash());

        let mut other = base.clone();
        other.token_decimals = 9;
        assert_ne!(base.content_hash(), other.content_hash());

        let mut other = base.clone();
        other.native_amount += 1;
        assert_ne!(base.content_hash(), other.content_hash());

        let mut other = base.clone();
        other.token_amount += 1;
        assert_ne!(base.content_hash(), other.content_hash());

        let sell = NormalizedTrade::sell("EQBuyerWallet", "EQJettonMaster", 25, 120_000)
            .with_token_meta("Kilo", "KILO", 6);
        assert_ne!(base.content_hash(), sell.content_hash());
    }

    #[test]
    fn test_string_fields_do_not_bleed_into_each_other() {
        let a = NormalizedTrade::buy("EQab", "cEQd", 1, 1);
        let b = NormalizedTrade::buy("EQabc", "EQd", 1, 1);
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_constructors_set_one_direction() {
        let buy = sample_buy();
        assert!(buy.is_buy && !buy.is_sell);

        let sell = NormalizedTrade::sell("w", "t", 1, 1);
        assert!(sell.is_sell && !sell.is_buy);

        let neither = NormalizedTrade::unclassified("w", "t");
        assert!(!neither.is_buy && !neither.is_sell);
    }

    #[test]
    fn test_hex_round_trip() {
        let hash = sample_buy().content_hash();
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(ContentHash::from_hex(&hex), Some(hash));
        assert_eq!(ContentHash::from_hex("zz"), None);
    }
}
