//! tonapi adapter: swap events for STON.fi and DeDust pools.

mod client;
mod dto;

pub use client::TonapiClient;
