//! Content-addressed trade ledgers.
//!
//! One [`TradeLedger`] holds a contest's purchases, another its sales.
//! Entries are keyed by content hash (insert-if-absent only) and carry an
//! insertion sequence used as the deterministic tie-break: leaderboard ties
//! and counterparty scans always resolve earliest-seen first.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::LedgerError;
use crate::domain::id::Address;
use crate::domain::trade::{ContentHash, NormalizedTrade};

/// A recorded trade plus its ledger-local insertion sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The recorded trade.
    pub trade: NormalizedTrade,
    /// Monotonic insertion order within this ledger.
    pub seq: u64,
}

/// Hash-keyed map of trades with insert-if-absent semantics.
///
/// The hash → entry mapping is a bijection: each stored entry is reachable
/// under exactly the hash of its trade, and re-inserting an existing trade
/// rejects without mutating anything.
#[derive(Debug, Default, Clone)]
pub struct TradeLedger {
    entries: HashMap<ContentHash, LedgerEntry>,
    next_seq: u64,
}

impl TradeLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted entries, preserving sequences.
    #[must_use]
    pub fn restore(entries: Vec<LedgerEntry>) -> Self {
        let mut next_seq = 0;
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            next_seq = next_seq.max(entry.seq + 1);
            map.insert(entry.trade.content_hash(), entry);
        }
        Self {
            entries: map,
            next_seq,
        }
    }

    /// Insert a trade, rejecting duplicates.
    ///
    /// Returns the assigned sequence. On [`LedgerError::Duplicate`] the
    /// ledger is untouched.
    pub fn insert(&mut self, trade: NormalizedTrade) -> Result<u64, LedgerError> {
        let hash = trade.content_hash();
        if self.entries.contains_key(&hash) {
            return Err(LedgerError::Duplicate { hash });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(hash, LedgerEntry { trade, seq });
        Ok(seq)
    }

    /// Remove the entry under `hash`.
    pub fn remove(&mut self, hash: &ContentHash) -> Result<LedgerEntry, LedgerError> {
        self.entries
            .remove(hash)
            .ok_or(LedgerError::NotFound { hash: *hash })
    }

    /// Earliest-seen entry by the given counterparty, if any.
    #[must_use]
    pub fn find_by_counterparty(&self, wallet: &Address) -> Option<&LedgerEntry> {
        self.entries
            .values()
            .filter(|e| &e.trade.wallet == wallet)
            .min_by_key(|e| e.seq)
    }

    /// Remove the earliest-seen entry by the given counterparty.
    pub fn remove_by_counterparty(&mut self, wallet: &Address) -> Option<LedgerEntry> {
        let hash = self
            .find_by_counterparty(wallet)
            .map(|e| e.trade.content_hash())?;
        self.entries.remove(&hash)
    }

    /// Top `n` entries by native amount descending, ties earliest-seen
    /// first. Never longer than `n`.
    #[must_use]
    pub fn top_n(&self, n: usize) -> Vec<LedgerEntry> {
        let mut ranked: Vec<&LedgerEntry> = self.entries.values().collect();
        ranked.sort_by(|a, b| {
            b.trade
                .native_amount
                .cmp(&a.trade.native_amount)
                .then(a.seq.cmp(&b.seq))
        });
        ranked.into_iter().take(n).cloned().collect()
    }

    /// All entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        let mut all: Vec<LedgerEntry> = self.entries.values().cloned().collect();
        all.sort_by_key(|e| e.seq);
        all
    }

    /// Whether an entry exists under `hash`.
    #[must_use]
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.entries.contains_key(hash)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
