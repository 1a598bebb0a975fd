#![allow(dead_code)]

pub mod identity_resolver;
pub mod recording_notifier;
pub mod scripted_source;
pub mod temp_store;
