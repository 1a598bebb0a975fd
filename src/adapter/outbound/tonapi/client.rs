//! tonapi HTTP client and swap-event extraction.
//!
//! One client serves both venues. STON.fi swaps arrive complete in the
//! pool's event listing as a `JettonSwap` action. DeDust only shows a
//! contract-exec stub there, so the full trace is fetched from the event
//! endpoint and the swap legs are read out of it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::dto::{AccountEvents, TonEvent};
use crate::app::config::IndexerConfig;
use crate::domain::group::{PoolRef, Venue};
use crate::error::Result;
use crate::port::outbound::indexer::{RawSwapEvent, SwapEventSource};

const ACTION_JETTON_SWAP: &str = "JettonSwap";
const ACTION_SMART_CONTRACT_EXEC: &str = "SmartContractExec";
const ACTION_JETTON_TRANSFER: &str = "JettonTransfer";
const ACTION_TON_TRANSFER: &str = "TonTransfer";
const STATUS_OK: &str = "ok";

/// Position of the jetton/native counter-leg inside a DeDust trace.
///
/// The vault routes through intermediate contract calls; the leg that
/// reaches the trader is the fourth action in practice.
const DEDUST_LEG_INDEX: usize = 3;

/// HTTP client for the tonapi event API.
pub struct TonapiClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
}

impl TonapiClient {
    /// Create a client with default HTTP settings.
    #[must_use]
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: HttpClient::new(),
            base_url,
            api_key,
            retry_max_attempts: 1,
            retry_backoff_ms: 0,
        }
    }

    /// Create a client from the indexer configuration.
    #[must_use]
    pub fn from_config(config: &IndexerConfig) -> Self {
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
            api_key: config.api_key.clone(),
            retry_max_attempts: config.retry_max_attempts,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    async fn get_with_retry<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        let max_attempts = self.retry_max_attempts.max(1);

        loop {
            attempt += 1;
            let response = self
                .http
                .get(url)
                .header("X-API-KEY", &self.api_key)
                .send()
                .await;
            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                    continue;
                }
            };

            let response = match response.error_for_status() {
                Ok(response) => response,
                Err(err) => return Err(err.into()),
            };

            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                }
            }
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn backoff(&self, attempt: u32, max_attempts: u32, err: &reqwest::Error) {
        warn!(
            attempt,
            max_attempts,
            error = %err,
            "tonapi request failed, retrying"
        );
        if self.retry_backoff_ms > 0 {
            sleep(Duration::from_millis(self.retry_backoff_ms)).await;
        }
    }

    /// Most recent event on the pool account, swap or not.
    async fn fetch_latest(&self, pool: &PoolRef) -> Result<Option<TonEvent>> {
        let url = format!(
            "{}/v2/accounts/{}/events?initiator=false&subject_only=false&limit=1",
            self.base_url,
            pool.address.as_str()
        );
        let listing: AccountEvents = self.get_with_retry(&url).await?;
        Ok(listing.events.into_iter().next())
    }

    /// Full trace of one event, with every intermediate action.
    async fn fetch_trace(&self, event_id: &str) -> Result<TonEvent> {
        let url = format!("{}/v2/events/{}", self.base_url, event_id);
        self.get_with_retry(&url).await
    }

    /// Read a STON.fi swap out of a listing event.
    fn extract_stonfi(event: TonEvent) -> Option<RawSwapEvent> {
        let action = event
            .actions
            .iter()
            .find(|a| a.action_type == ACTION_JETTON_SWAP && a.status == STATUS_OK)?;
        let swap = action.jetton_swap.as_ref()?;
        let jetton = swap
            .jetton_master_out
            .as_ref()
            .or(swap.jetton_master_in.as_ref())?;

        Some(RawSwapEvent {
            event_id: event.event_id,
            wallet: swap.user_wallet.address.clone(),
            native_in: u128::from(swap.ton_in),
            native_out: u128::from(swap.ton_out),
            token_in_raw: zero_if_empty(&swap.amount_in),
            token_out_raw: zero_if_empty(&swap.amount_out),
            token_address: jetton.address.clone(),
            token_name: jetton.name.clone(),
            token_symbol: jetton.symbol.clone(),
            token_decimals: jetton.decimals,
            timestamp: event.timestamp,
        })
    }

    /// Read a DeDust swap out of a full trace.
    ///
    /// Buys open with the vault exec carrying the attached TON and pay
    /// the jetton out in the counter-leg; sells open with the jetton
    /// transfer in and pay TON out in the counter-leg. Anything else is
    /// not a swap.
    fn extract_dedust(trace: TonEvent) -> Option<RawSwapEvent> {
        let first = trace.actions.first()?;
        if first.status != STATUS_OK {
            return None;
        }
        let leg = trace.actions.get(DEDUST_LEG_INDEX)?;

        if first.action_type == ACTION_SMART_CONTRACT_EXEC
            && leg.action_type == ACTION_JETTON_TRANSFER
        {
            let exec = first.smart_contract_exec.as_ref()?;
            let transfer = leg.jetton_transfer.as_ref()?;
            let jetton = transfer.jetton.as_ref()?;
            return Some(RawSwapEvent {
                event_id: trace.event_id,
                wallet: exec.executor.address.clone(),
                native_in: u128::from(exec.ton_attached),
                native_out: 0,
                token_in_raw: "0".into(),
                token_out_raw: zero_if_empty(&transfer.amount),
                token_address: jetton.address.clone(),
                token_name: jetton.name.clone(),
                token_symbol: jetton.symbol.clone(),
                token_decimals: jetton.decimals,
                timestamp: trace.timestamp,
            });
        }

        if first.action_type == ACTION_JETTON_TRANSFER && leg.action_type == ACTION_TON_TRANSFER {
            let transfer = first.jetton_transfer.as_ref()?;
            let jetton = transfer.jetton.as_ref()?;
            let ton = leg.ton_transfer.as_ref()?;
            return Some(RawSwapEvent {
                event_id: trace.event_id,
                wallet: transfer.sender.as_ref()?.address.clone(),
                native_in: 0,
                native_out: u128::from(ton.amount),
                token_in_raw: zero_if_empty(&transfer.amount),
                token_out_raw: "0".into(),
                token_address: jetton.address.clone(),
                token_name: jetton.name.clone(),
                token_symbol: jetton.symbol.clone(),
                token_decimals: jetton.decimals,
                timestamp: trace.timestamp,
            });
        }

        None
    }

}

fn zero_if_empty(amount: &str) -> String {
    if amount.is_empty() {
        "0".into()
    } else {
        amount.to_string()
    }
}

#[async_trait]
impl SwapEventSource for TonapiClient {
    async fn latest_event(&self, pool: &PoolRef) -> Result<Option<RawSwapEvent>> {
        let Some(event) = self.fetch_latest(pool).await? else {
            return Ok(None);
        };

        match pool.venue {
            Venue::StonFi => Ok(Self::extract_stonfi(event)),
            Venue::DeDust => {
                // Only chase the trace for events that can be a swap.
                let worth_tracing = event.actions.first().is_some_and(|a| {
                    a.status == STATUS_OK
                        && (a.action_type == ACTION_SMART_CONTRACT_EXEC
                            || a.action_type == ACTION_JETTON_TRANSFER)
                });
                if !worth_tracing {
                    debug!(pool = %pool.address, event = %event.event_id, "Latest event is not a swap");
                    return Ok(None);
                }
                let trace = self.fetch_trace(&event.event_id).await?;
                Ok(Self::extract_dedust(trace))
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "tonapi"
    }
}
