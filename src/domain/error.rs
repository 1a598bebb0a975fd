//! Domain rejection errors for ledgers, contests, and event intake.
//!
//! These are expected outcomes callers match on (a duplicate buy, a stop
//! with nothing running), not infrastructure failures.
//!
//! # Examples
//!
//! Handling a duplicate insert:
//!
//! ```
//! use tonrally::domain::error::LedgerError;
//! use tonrally::domain::ledger::TradeLedger;
//! use tonrally::domain::trade::NormalizedTrade;
//!
//! let mut ledger = TradeLedger::new();
//! let trade = NormalizedTrade::buy("EQBuYeR", "EQToKeN", 10, 4_000);
//!
//! ledger.insert(trade.clone()).unwrap();
//! assert!(matches!(
//!     ledger.insert(trade),
//!     Err(LedgerError::Duplicate { .. })
//! ));
//! ```

use thiserror::Error;

use crate::domain::id::{Address, GroupId};
use crate::domain::trade::ContentHash;

/// Errors returned by ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The trade is already recorded under this content hash.
    #[error("duplicate trade: {hash}")]
    Duplicate {
        /// Content hash of the rejected trade.
        hash: ContentHash,
    },

    /// No entry exists under this content hash.
    #[error("trade not found: {hash}")]
    NotFound {
        /// The hash that was looked up.
        hash: ContentHash,
    },
}

/// Errors returned by contest lifecycle and operator actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContestError {
    /// A contest is already running for this group.
    #[error("contest already active for group {group}")]
    AlreadyActive { group: GroupId },

    /// No running contest for this group.
    #[error("no active contest for group {group}")]
    NotActive { group: GroupId },

    /// The group was never registered with the bot.
    #[error("unknown group {group}")]
    UnknownGroup { group: GroupId },

    /// The group has no jetton address bound.
    #[error("no token bound for group {group}")]
    NoToken { group: GroupId },

    /// No TON-quoted pool was found for the token on the supported venues.
    #[error("no pools found for token {token}")]
    NoPools { token: Address },

    /// No standing purchase for the given wallet.
    #[error("no standing purchase for wallet {wallet}")]
    NoPurchase { wallet: Address },
}

/// Errors for events that cannot be turned into a trade.
///
/// Always contained to the offending event; the poll tick logs and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The event payload is structurally unusable (bad amount, negative
    /// decimals, missing fields).
    #[error("malformed event: {reason}")]
    Malformed { reason: String },
}

impl EventError {
    /// Convenience constructor for malformed-event errors.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}
