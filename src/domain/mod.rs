//! Venue-agnostic contest logic: trades, ledgers, contests, groups.

pub mod amount;
pub mod contest;
pub mod error;
pub mod group;
pub mod id;
pub mod ledger;
pub mod registry;
pub mod trade;

// Core identifiers
pub use id::{Address, GroupId};

// Trades and dedup ledgers
pub use ledger::{LedgerEntry, TradeLedger};
pub use trade::{ContentHash, NormalizedTrade};

// Contest state and registry
pub use contest::{ContestRecord, PurchaseOutcome, SaleOutcome};
pub use registry::ContestRegistry;

// Group configuration
pub use group::{GroupDirectory, GroupProfile, PoolRef, Venue, DEFAULT_EMOJI};

// Domain rejections
pub use error::{ContestError, EventError, LedgerError};
