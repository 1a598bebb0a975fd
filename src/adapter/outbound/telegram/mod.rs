//! Telegram bot integration: contest notices out, operator commands in.
//!
//! The notifier side queues [`crate::port::outbound::notifier::Notice`]
//! values for a delivery worker; the command side runs a long-polling
//! worker that feeds the [`CommandDispatcher`].

mod command;
mod dispatch;
mod format;
mod notifier;

pub use dispatch::{command_worker, CommandDispatcher};
pub use notifier::TelegramNotifier;
