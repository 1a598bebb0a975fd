//! Swap-event source port: latest DEX activity for a pool.

use async_trait::async_trait;

use crate::domain::group::PoolRef;
use crate::error::Result;

/// One swap event as reported by the indexer, before classification.
///
/// Native amounts are raw nanotons; jetton amounts stay as the decimal
/// strings the indexer serves until the classifier scales them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSwapEvent {
    /// Indexer-assigned event id, stable across polls.
    pub event_id: String,
    /// Counterparty wallet in whatever form the indexer reports.
    pub wallet: String,
    /// Native coin paid into the pool, in nanotons. Zero when none.
    pub native_in: u128,
    /// Native coin paid out of the pool, in nanotons. Zero when none.
    pub native_out: u128,
    /// Raw jetton amount paid into the pool (sell side).
    pub token_in_raw: String,
    /// Raw jetton amount paid out of the pool (buy side).
    pub token_out_raw: String,
    /// Jetton master address as reported, not yet canonicalized.
    pub token_address: String,
    /// Jetton display name.
    pub token_name: String,
    /// Jetton ticker symbol.
    pub token_symbol: String,
    /// Jetton decimal places.
    pub token_decimals: i64,
    /// Event unix timestamp.
    pub timestamp: i64,
}

/// Fetches the most recent swap activity for a pool.
#[async_trait]
pub trait SwapEventSource: Send + Sync {
    /// Latest swap event on the pool, or `None` when the newest event is
    /// not a swap this source understands.
    async fn latest_event(&self, pool: &PoolRef) -> Result<Option<RawSwapEvent>>;

    /// Source name for logging/debugging.
    fn source_name(&self) -> &'static str;
}
