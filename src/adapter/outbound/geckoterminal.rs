//! GeckoTerminal adapter: discovers TON-quoted pools for a jetton.
//!
//! The search endpoint returns JSON:API resources; only pools on the
//! supported venues whose quote token is native TON are kept, one pool
//! per venue.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::app::config::LocatorConfig;
use crate::domain::group::{PoolRef, Venue};
use crate::domain::id::Address;
use crate::error::Result;
use crate::port::outbound::locator::PoolLocator;

/// Quote-token resource id for native TON on the `ton` network.
const TON_QUOTE_ID: &str = "ton_EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";

/// Pool search over the GeckoTerminal public API.
pub struct GeckoTerminalLocator {
    http: HttpClient,
    base_url: String,
}

impl GeckoTerminalLocator {
    /// Create a locator with default HTTP settings.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: HttpClient::new(),
            base_url,
        }
    }

    /// Create a locator from the locator configuration.
    #[must_use]
    pub fn from_config(config: &LocatorConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    /// Keep TON-quoted pools on known venues, first hit per venue.
    ///
    /// Search results arrive ranked, so the first pool of a venue is the
    /// one with the deepest liquidity.
    fn collect_pools(response: SearchResponse) -> Vec<PoolRef> {
        let mut pools: Vec<PoolRef> = Vec::new();
        for resource in &response.data {
            let Some(pool) = Self::to_pool_ref(resource) else {
                continue;
            };
            if pools.iter().any(|p| p.venue == pool.venue) {
                continue;
            }
            pools.push(pool);
        }
        pools
    }

    fn to_pool_ref(resource: &PoolResource) -> Option<PoolRef> {
        let relationships = resource.relationships.as_ref()?;
        let quote = relationships.quote_token.as_ref()?.data.as_ref()?;
        if quote.id != TON_QUOTE_ID {
            return None;
        }
        let dex = relationships.dex.as_ref()?.data.as_ref()?;
        let venue = Venue::parse(&dex.id)?;
        let address = resource.attributes.as_ref()?.address.clone();
        Some(PoolRef {
            address: Address::new(address),
            venue,
        })
    }
}

#[async_trait]
impl PoolLocator for GeckoTerminalLocator {
    async fn find_pools(&self, token: &Address) -> Result<Vec<PoolRef>> {
        let url = format!("{}/api/v2/search/pools", self.base_url);
        let response: SearchResponse = self
            .http
            .get(&url)
            .query(&[
                ("query", token.as_str()),
                ("network", "ton"),
                ("page", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let pools = Self::collect_pools(response);
        debug!(token = %token, pools = pools.len(), "Pool search finished");
        Ok(pools)
    }

    fn source_name(&self) -> &'static str {
        "geckoterminal"
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<PoolResource>,
}

#[derive(Debug, Deserialize)]
struct PoolResource {
    attributes: Option<PoolAttributes>,
    relationships: Option<PoolRelationships>,
}

#[derive(Debug, Deserialize)]
struct PoolAttributes {
    address: String,
}

#[derive(Debug, Deserialize)]
struct PoolRelationships {
    dex: Option<Relationship>,
    quote_token: Option<Relationship>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    data: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    id: String,
}
