//! toncenter adapter: canonical forms and validity of TON addresses.
//!
//! Wallets come off the indexer in raw form (`0:abc...`); `packAddress`
//! turns them into the friendly bounceable form every ledger key uses.
//! `detectAddress` backs operator-input validation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::warn;

use crate::app::config::ResolverConfig;
use crate::domain::error::EventError;
use crate::domain::id::Address;
use crate::error::{Error, Result};
use crate::port::outbound::resolver::AddressResolver;

/// Address resolution over a toncenter-compatible HTTP API.
pub struct ToncenterResolver {
    http: HttpClient,
    base_url: String,
}

impl ToncenterResolver {
    /// Create a resolver with default HTTP settings.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: HttpClient::new(),
            base_url,
        }
    }

    /// Create a resolver from the resolver configuration.
    #[must_use]
    pub fn from_config(config: &ResolverConfig) -> Self {
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

    async fn call<T>(&self, endpoint: &str, address: &str) -> Result<ApiEnvelope<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[("address", address)])
            .send()
            .await?;

        // The API answers a garbage address with a client error. That is
        // a verdict on the input, not an outage, so it must not surface
        // as a retryable failure.
        match response.error_for_status() {
            Ok(response) => Ok(response.json().await?),
            Err(err) if err.status().is_some_and(|s| s.is_client_error()) => Ok(ApiEnvelope {
                ok: false,
                result: None,
                error: Some(err.to_string()),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn packed_address(envelope: ApiEnvelope<String>, original: &str) -> Result<Address> {
        if !envelope.ok {
            return Err(Error::Event(EventError::malformed(format!(
                "resolver refused address {original}: {}",
                envelope.error.unwrap_or_else(|| "no detail".into())
            ))));
        }
        envelope.result.map(Address::new).ok_or_else(|| {
            Error::Event(EventError::malformed(format!(
                "resolver returned no packed form for {original}"
            )))
        })
    }

    /// An address counts as valid only when it already is the friendly
    /// bounceable form, matching what block explorers display.
    fn is_canonical(envelope: ApiEnvelope<DetectedForms>, address: &str) -> bool {
        envelope.ok
            && envelope
                .result
                .and_then(|forms| forms.bounceable)
                .and_then(|form| form.b64url)
                .is_some_and(|b64url| b64url == address)
    }
}

#[async_trait]
impl AddressResolver for ToncenterResolver {
    async fn canonicalize(&self, address: &str) -> Result<Address> {
        let envelope = self.call::<String>("packAddress", address).await?;
        Self::packed_address(envelope, address)
    }

    async fn validate(&self, address: &str) -> Result<bool> {
        let envelope = self.call::<DetectedForms>("detectAddress", address).await?;
        Ok(Self::is_canonical(envelope, address))
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    /// Missing on mirrors that only send `result`; treated as success.
    #[serde(default = "default_ok")]
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

fn default_ok() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DetectedForms {
    bounceable: Option<AddressForm>,
}

#[derive(Debug, Deserialize)]
struct AddressForm {
    b64url: Option<String>,
}
