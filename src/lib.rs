//! Chat Latency Bot
//!
//! A synthetic load-and-latency measurement client for chat-style messaging
//! backends. It exercises a TCP stream session (round-trip latency) or a UDP
//! multicast feed (one-way latency), stamping every message with a monotonic
//! microsecond timestamp and reporting mean, median and p99 at the end of a
//! run.

pub mod app;
pub mod cli;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod sink;
pub mod stats;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, ReceivedMessage, RunResult, RunSummary, TimestampedMessage};
pub use sink::LatencySink;
pub use stats::{aggregate, LatencyAggregator};
pub use types::{Framing, Mode};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
    pub const DEFAULT_SERVER_PORT: u16 = 8080;
    pub const DEFAULT_MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 0, 0, 1);
    pub const DEFAULT_MULTICAST_PORT: u16 = 8081;
    pub const DEFAULT_BUFFER_SIZE: usize = 1024;
    pub const DEFAULT_SEND_RATE: u32 = 10;
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const MAX_SEND_RATE: u32 = 10_000;
    pub const MAX_DURATION_SECS: u64 = 86_400;
    pub const MIN_BUFFER_SIZE: usize = 16;
    pub const MAX_BUFFER_SIZE: usize = 65_536;

    /// File name of the persisted result for a bot
    pub fn result_file_name(bot_id: u64) -> String {
        format!("latency_result_{}.txt", bot_id)
    }
}
