//! Data models and structures for the latency bot

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::Config;
pub use metrics::{ReceivedMessage, RunResult, RunSummary, TimestampedMessage};
