//! Upstream statistics API: response types and blocking client

pub mod client;
pub mod types;
