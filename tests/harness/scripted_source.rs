use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use tonrally::domain::PoolRef;
use tonrally::error::{Error, Result};
use tonrally::port::outbound::indexer::{RawSwapEvent, SwapEventSource};

/// Deterministic test double for the swap indexer.
///
/// Each pool address carries a queue of scripted poll results; an
/// exhausted queue reports no event, like a quiet pool.
#[derive(Default)]
pub struct ScriptedEventSource {
    queues: Mutex<HashMap<String, VecDeque<Scripted>>>,
}

enum Scripted {
    Event(RawSwapEvent),
    Empty,
    Error(String),
}

impl ScriptedEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&self, pool: &str, event: RawSwapEvent) {
        self.push(pool, Scripted::Event(event));
    }

    pub fn push_empty(&self, pool: &str) {
        self.push(pool, Scripted::Empty);
    }

    pub fn push_error(&self, pool: &str, message: &str) {
        self.push(pool, Scripted::Error(message.to_string()));
    }

    fn push(&self, pool: &str, scripted: Scripted) {
        self.queues
            .lock()
            .expect("lock queues")
            .entry(pool.to_string())
            .or_default()
            .push_back(scripted);
    }
}

#[async_trait]
impl SwapEventSource for ScriptedEventSource {
    async fn latest_event(&self, pool: &PoolRef) -> Result<Option<RawSwapEvent>> {
        let next = self
            .queues
            .lock()
            .expect("lock queues")
            .get_mut(pool.address.as_str())
            .and_then(VecDeque::pop_front);

        match next {
            Some(Scripted::Event(event)) => Ok(Some(event)),
            Some(Scripted::Empty) | None => Ok(None),
            Some(Scripted::Error(message)) => Err(Error::Connection(message)),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Raw buy: `ton` whole TON into the pool, jetton out (6 decimals).
pub fn raw_buy(event_id: &str, wallet: &str, ton: u64) -> RawSwapEvent {
    RawSwapEvent {
        event_id: event_id.to_string(),
        wallet: wallet.to_string(),
        native_in: u128::from(ton) * 1_000_000_000,
        native_out: 0,
        token_in_raw: "0".to_string(),
        token_out_raw: (u128::from(ton) * 4_000_000_000).to_string(),
        token_address: "EQJetton".to_string(),
        token_name: "Kilo".to_string(),
        token_symbol: "KILO".to_string(),
        token_decimals: 6,
        timestamp: 1_700_000_000,
    }
}

/// Raw sell: jetton into the pool, `ton` whole TON out.
pub fn raw_sell(event_id: &str, wallet: &str, ton: u64) -> RawSwapEvent {
    RawSwapEvent {
        event_id: event_id.to_string(),
        wallet: wallet.to_string(),
        native_in: 0,
        native_out: u128::from(ton) * 1_000_000_000,
        token_in_raw: (u128::from(ton) * 4_000_000_000).to_string(),
        token_out_raw: "0".to_string(),
        token_address: "EQJetton".to_string(),
        token_name: "Kilo".to_string(),
        token_symbol: "KILO".to_string(),
        token_decimals: 6,
        timestamp: 1_700_000_000,
    }
}
