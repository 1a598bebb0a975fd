//! SQLite persistence for group profiles and contest ledgers.
//!
//! Provides connection management, schema definitions, Diesel model
//! types, and the [`SqliteContestStore`].

pub mod connection;
pub mod model;
pub mod schema;
pub mod store;

pub use connection::{create_pool, run_migrations, DbPool};
pub use store::SqliteContestStore;
