//! Pool locator port: find a token's TON-quoted DEX pools.

use async_trait::async_trait;

use crate::domain::group::PoolRef;
use crate::domain::id::Address;
use crate::error::Result;

/// Discovers liquidity pools for a jetton on the supported venues.
#[async_trait]
pub trait PoolLocator: Send + Sync {
    /// TON-quoted pools trading `token` on STON.fi or DeDust.
    ///
    /// An empty result means the token has no supported pool; callers
    /// reject the binding in that case.
    async fn find_pools(&self, token: &Address) -> Result<Vec<PoolRef>>;

    /// Source name for logging/debugging.
    fn source_name(&self) -> &'static str;
}
