// Zero-copy NASDAQ ITCH 5.0 decoding with an asynchronous, lock-free
// persistence pipeline.

pub mod core;
pub mod engine;
pub mod feed;
pub mod memory;
pub mod storage;
pub mod utils;

// Re-exports of common types
pub use crate::core::messages::{MessageBody, MessageHeader, ParsedMessage};
pub use crate::core::types::{price_to_f64, stock_symbol, MessageType};
pub use crate::engine::recorder::{Recorder, RecorderConfig};
pub use crate::feed::decoder::ItchDecoder;
pub use crate::memory::mpmc_ring::MpmcRing;
pub use crate::storage::sink::{SinkError, WriteMode};

// Error types
pub use anyhow::Result;

// Logging
pub use tracing;

// Version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests;
