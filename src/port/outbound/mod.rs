//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as the swap
//! indexer, pool locator, address resolver, notifications, and storage.

pub mod indexer;
pub mod locator;
pub mod notifier;
pub mod resolver;
pub mod store;
