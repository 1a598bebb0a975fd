//! tonapi wire types.
//!
//! Events arrive as `{"events": [...]}` from the account listing and as a
//! bare event object from the trace endpoint. Every action carries a
//! `type` discriminator plus a payload field named after the type; only
//! the payloads this engine reads are modeled, everything else is
//! tolerated and ignored.

use serde::Deserialize;

/// Response of `GET /v2/accounts/{account}/events`.
#[derive(Debug, Deserialize)]
pub struct AccountEvents {
    #[serde(default)]
    pub events: Vec<TonEvent>,
}

/// One event, from the listing or the trace endpoint.
#[derive(Debug, Deserialize)]
pub struct TonEvent {
    pub event_id: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub actions: Vec<EventAction>,
}

/// Action envelope: discriminator, status, and the possible payloads.
#[derive(Debug, Deserialize)]
pub struct EventAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "JettonSwap")]
    pub jetton_swap: Option<JettonSwapAction>,
    #[serde(rename = "SmartContractExec")]
    pub smart_contract_exec: Option<SmartContractExecAction>,
    #[serde(rename = "JettonTransfer")]
    pub jetton_transfer: Option<JettonTransferAction>,
    #[serde(rename = "TonTransfer")]
    pub ton_transfer: Option<TonTransferAction>,
}

/// STON.fi router swap, one action with both legs.
#[derive(Debug, Deserialize)]
pub struct JettonSwapAction {
    #[serde(default)]
    pub amount_in: String,
    #[serde(default)]
    pub amount_out: String,
    #[serde(default)]
    pub ton_in: u64,
    #[serde(default)]
    pub ton_out: u64,
    pub user_wallet: AccountRef,
    pub jetton_master_in: Option<JettonMeta>,
    pub jetton_master_out: Option<JettonMeta>,
}

/// DeDust vault call; the jetton leg lives elsewhere in the trace.
#[derive(Debug, Deserialize)]
pub struct SmartContractExecAction {
    pub executor: AccountRef,
    #[serde(default)]
    pub ton_attached: u64,
}

/// Jetton movement inside a trace.
#[derive(Debug, Deserialize)]
pub struct JettonTransferAction {
    pub sender: Option<AccountRef>,
    pub recipient: Option<AccountRef>,
    #[serde(default)]
    pub amount: String,
    pub jetton: Option<JettonMeta>,
}

/// Native coin movement inside a trace.
#[derive(Debug, Deserialize)]
pub struct TonTransferAction {
    pub sender: Option<AccountRef>,
    pub recipient: Option<AccountRef>,
    #[serde(default)]
    pub amount: u64,
}

/// Account reference as tonapi reports it (raw form address).
#[derive(Debug, Deserialize)]
pub struct AccountRef {
    pub address: String,
    pub name: Option<String>,
}

/// Jetton metadata attached to swap and transfer actions.
#[derive(Debug, Clone, Deserialize)]
pub struct JettonMeta {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: i64,
}
