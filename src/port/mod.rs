//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the extension points adapters implement to integrate with
//! external systems (the chain indexer, pool discovery, address
//! resolution, Telegram, SQLite).

pub mod outbound;
