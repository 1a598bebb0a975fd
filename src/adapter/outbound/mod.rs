//! Outbound adapters (driven side).

pub mod geckoterminal;
pub mod sqlite;
#[cfg(feature = "telegram")]
pub mod telegram;
pub mod tonapi;
pub mod toncenter;
