//! Per-group contest state and buy/sell reconciliation.

use parking_lot::{Mutex, RwLock};

use crate::domain::id::Address;
use crate::domain::ledger::{LedgerEntry, TradeLedger};
use crate::domain::trade::NormalizedTrade;

/// Result of recording a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Newly recorded and standing; worth announcing.
    Accepted {
        /// Sequence assigned in the purchase ledger.
        seq: u64,
    },
    /// Already on the ledger; nothing changed.
    Duplicate,
    /// Recorded then immediately removed because the wallet previously
    /// sold during this contest.
    Disqualified,
}

/// Result of recording a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleOutcome {
    /// Newly recorded; carries the purchase it cancelled, if any.
    Recorded {
        /// Standing purchase by the same wallet that was removed.
        cancelled: Option<LedgerEntry>,
    },
    /// Already on the ledger; nothing changed, no reconciliation.
    Duplicate,
}

/// One group's contest: purchase ledger, sale ledger, and deadline.
///
/// Active while the deadline is set. A manual stop clears the deadline and
/// sales but keeps purchases so the final standings stay listable; the
/// record itself is replaced by the next start.
///
/// Each ledger sits behind its own lock. Compound operations take the
/// locks one at a time and never nested, so they cannot deadlock against
/// each other.
#[derive(Debug, Default)]
pub struct ContestRecord {
    purchases: Mutex<TradeLedger>,
    sales: Mutex<TradeLedger>,
    deadline: RwLock<Option<i64>>,
}

impl ContestRecord {
    /// Fresh record with empty ledgers, active until `deadline`.
    #[must_use]
    pub fn new(deadline: i64) -> Self {
        Self {
            purchases: Mutex::new(TradeLedger::new()),
            sales: Mutex::new(TradeLedger::new()),
            deadline: RwLock::new(Some(deadline)),
        }
    }

    /// Rebuild a record from persisted state.
    #[must_use]
    pub fn restore(
        purchases: Vec<LedgerEntry>,
        sales: Vec<LedgerEntry>,
        deadline: Option<i64>,
    ) -> Self {
        Self {
            purchases: Mutex::new(TradeLedger::restore(purchases)),
            sales: Mutex::new(TradeLedger::restore(sales)),
            deadline: RwLock::new(deadline),
        }
    }

    /// Unix deadline, if the contest is active.
    #[must_use]
    pub fn deadline(&self) -> Option<i64> {
        *self.deadline.read()
    }

    /// Whether the contest is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deadline.read().is_some()
    }

    /// True iff a deadline exists and `now` has reached it.
    ///
    /// Exactly at the deadline counts as ended. A record with no deadline
    /// (manually concluded) is not "ended" again.
    #[must_use]
    pub fn check_ended(&self, now: i64) -> bool {
        self.deadline.read().is_some_and(|d| now >= d)
    }

    /// Record a purchase and reconcile it against the sale ledger.
    ///
    /// A wallet that already sold during this contest has its fresh
    /// purchase removed again and reported as [`PurchaseOutcome::Disqualified`].
    pub fn record_purchase(&self, trade: NormalizedTrade) -> PurchaseOutcome {
        let wallet = trade.wallet.clone();
        let hash = trade.content_hash();

        // insert only ever fails with Duplicate
        let seq = match self.purchases.lock().insert(trade) {
            Ok(seq) => seq,
            Err(_) => return PurchaseOutcome::Duplicate,
        };

        let sold_before = self.sales.lock().find_by_counterparty(&wallet).is_some();
        if sold_before {
            // remove is idempotent here; a racing removal already did the job
            let _ = self.purchases.lock().remove(&hash);
            return PurchaseOutcome::Disqualified;
        }

        PurchaseOutcome::Accepted { seq }
    }

    /// Record a sale and cancel any standing purchase by the same wallet.
    pub fn record_sale(&self, trade: NormalizedTrade) -> SaleOutcome {
        let wallet = trade.wallet.clone();

        if self.sales.lock().insert(trade).is_err() {
            return SaleOutcome::Duplicate;
        }

        let cancelled = self.purchases.lock().remove_by_counterparty(&wallet);
        SaleOutcome::Recorded { cancelled }
    }

    /// Snapshot of the top `n` standing purchases.
    ///
    /// Clones under the ledger lock and releases before the caller
    /// formats anything.
    #[must_use]
    pub fn leaderboard(&self, n: usize) -> Vec<LedgerEntry> {
        self.purchases.lock().top_n(n)
    }

    /// 1-based position of a wallet in the full standings, if it has a
    /// standing purchase.
    #[must_use]
    pub fn rank_of(&self, wallet: &Address) -> Option<usize> {
        let purchases = self.purchases.lock();
        let full = purchases.top_n(purchases.len());
        full.iter()
            .position(|e| &e.trade.wallet == wallet)
            .map(|i| i + 1)
    }

    /// Remove one wallet's earliest standing purchase (operator action).
    pub fn remove_purchase_by_wallet(&self, wallet: &Address) -> Option<LedgerEntry> {
        self.purchases.lock().remove_by_counterparty(wallet)
    }

    /// All standing purchases in insertion order.
    #[must_use]
    pub fn purchases_snapshot(&self) -> Vec<LedgerEntry> {
        self.purchases.lock().entries()
    }

    /// All recorded sales in insertion order.
    #[must_use]
    pub fn sales_snapshot(&self) -> Vec<LedgerEntry> {
        self.sales.lock().entries()
    }

    /// Number of standing purchases.
    #[must_use]
    pub fn purchase_count(&self) -> usize {
        self.purchases.lock().len()
    }

    /// Manual-stop cleanup: drop the deadline and the sale ledger, keep
    /// the purchases.
    pub fn conclude_manual(&self) {
        *self.deadline.write() = None;
        *self.sales.lock() = TradeLedger::new();
    }
}
