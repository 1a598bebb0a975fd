//! tonrally - Telegram buy-competition engine for TON jetton tokens.
//!
//! A group binds a jetton token, an admin starts a time-boxed contest, and
//! the engine polls the token's DEX pools for swaps: buys land on a
//! content-addressed purchase ledger, sells disqualify the seller, and the
//! ranked standings are announced back into the group.
//!
//! # Architecture
//!
//! Hexagonal layout: pure domain state in the middle, ports at the seams,
//! adapters for each external system.
//!
//! - [`domain`] - trades, content-hashed ledgers, contest records, the
//!   contest registry, and the group directory
//! - [`service`] - the engine services: event classification, contest
//!   lifecycle, the per-group poll scheduler, and the backup sync
//! - [`port`] - trait contracts the adapters implement
//! - [`adapter`] - tonapi (swap events), GeckoTerminal (pool discovery),
//!   toncenter (address canonicalization), Telegram (commands and
//!   alerts), SQLite (persistence)
//! - [`app`] - configuration loading and service wiring
//! - [`error`] - error types for the crate
//!
//! # Features
//!
//! - `telegram` (default) - the Telegram command and notification surface
//!
//! # Example
//!
//! ```
//! use tonrally::domain::{ContestRegistry, GroupId, NormalizedTrade};
//!
//! let registry = ContestRegistry::new();
//! let record = registry.start(GroupId::new(-100), i64::MAX).unwrap();
//! record.record_purchase(NormalizedTrade::buy("EQBuyer", "EQJetton", 25, 120_000));
//! assert_eq!(record.leaderboard(10).len(), 1);
//! ```

pub mod adapter;
pub mod app;
pub mod domain;
pub mod error;
pub mod port;
pub mod service;
