//! Notifier port for contest notifications.
//!
//! This module defines the trait for pushing contest events to the
//! groups that care about them: kickoffs, buy alerts, and endings.

use crate::domain::id::{Address, GroupId};
use crate::domain::ledger::LedgerEntry;

/// Notices that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Notice {
    /// A contest just started in a group.
    ContestStarted {
        /// Group the contest runs in.
        group: GroupId,
        /// Unix deadline of the contest.
        deadline: i64,
    },
    /// A purchase was newly accepted and survived reconciliation.
    BuyAlert(BuyAlertNotice),
    /// A contest reached its deadline and was concluded.
    ContestEnded {
        /// Group whose contest ended.
        group: GroupId,
    },
}

/// Buy-alert payload: everything the renderer needs, snapshotted at
/// record time so no lock is held while formatting.
#[derive(Debug, Clone)]
pub struct BuyAlertNotice {
    /// Group to announce in.
    pub group: GroupId,
    /// Jetton display name for the header.
    pub token_name: String,
    /// Jetton ticker symbol.
    pub token_symbol: String,
    /// Buyer in canonical form.
    pub buyer: Address,
    /// TON spent, whole units.
    pub ton_amount: u64,
    /// Jetton amount bought, whole units.
    pub token_amount: u64,
    /// Group's alert emoji.
    pub emoji: String,
    /// 1-based position in the current standings.
    pub rank: usize,
    /// Top standings snapshot (first three get medals).
    pub top: Vec<LedgerEntry>,
    /// Unix deadline, for the countdown footer.
    pub deadline: i64,
}

/// Trait for notification handlers.
///
/// Implement this trait to receive contest notices. Notifications are
/// fire-and-forget.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `notify` should not block or perform slow I/O synchronously
/// - Spawn or queue slow operations (e.g. HTTP calls) instead
pub trait Notifier: Send + Sync {
    /// Handle a notice.
    ///
    /// This method should return quickly. The Telegram implementation
    /// queues the rendered message for a worker task.
    fn notify(&self, notice: Notice);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts notices to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, notice: Notice) {
        for notifier in &self.notifiers {
            notifier.notify(notice.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: Notice) {}
}

/// A logging notifier that logs notices via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        use tracing::info;
        match notice {
            Notice::ContestStarted { group, deadline } => {
                info!(group = %group, deadline, "Contest started");
            }
            Notice::BuyAlert(alert) => {
                info!(
                    group = %alert.group,
                    buyer = %alert.buyer,
                    ton = alert.ton_amount,
                    rank = alert.rank,
                    "New buy"
                );
            }
            Notice::ContestEnded { group } => {
                info!(group = %group, "Contest ended");
            }
        }
    }
}
