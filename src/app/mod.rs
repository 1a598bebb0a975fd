//! Application layer - configuration and service wiring.

pub mod config;
mod orchestrator;

pub use config::Config;
pub use orchestrator::App;
