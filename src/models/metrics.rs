//! Message and latency result data models

use crate::types::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message carrying its send timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampedMessage {
    /// Bot that produced the message
    pub sender_id: u64,

    /// Per-sender counter starting at 0, diagnostics only
    pub sequence: u64,

    /// Monotonic send time in microseconds
    pub timestamp_us: u64,
}

/// What the receive side recovers from a payload. Only the timestamp is
/// needed for a sample; the other fields may be unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub sender_id: Option<u64>,
    pub sequence: Option<u64>,
    pub timestamp_us: u64,
}

impl From<TimestampedMessage> for ReceivedMessage {
    fn from(message: TimestampedMessage) -> Self {
        Self {
            sender_id: Some(message.sender_id),
            sequence: Some(message.sequence),
            timestamp_us: message.timestamp_us,
        }
    }
}

/// Latency statistics for one run, in microseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Number of samples the statistics were computed from
    pub sample_count: usize,

    /// Arithmetic mean
    pub mean_us: f64,

    /// 50th percentile
    pub median_us: f64,

    /// 99th percentile
    pub p99_us: f64,

    /// Smallest sample
    pub min_us: f64,

    /// Largest sample
    pub max_us: f64,

    /// Population standard deviation
    pub std_dev_us: f64,
}

impl RunResult {
    /// The persisted record: `mean,median,p99` with two decimals
    pub fn record_line(&self) -> String {
        format!("{:.2},{:.2},{:.2}", self.mean_us, self.median_us, self.p99_us)
    }
}

/// What happened during a run, independent of the latency numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Correlation id shared with the log output
    pub run_id: String,

    /// Transport exercised
    pub mode: Mode,

    /// Bot identifier
    pub bot_id: u64,

    /// Messages written by the send loop (stream sender only)
    pub messages_sent: u64,

    /// Samples appended to the sink
    pub samples_recorded: usize,

    /// Payloads that did not decode
    pub dropped_malformed: u64,

    /// Decoded messages stamped in the receiver's future
    pub dropped_skewed: u64,

    /// Whether the run ended through an interrupt
    pub interrupted: bool,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run ended
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    /// Start a new summary
    pub fn new(run_id: String, mode: Mode, bot_id: u64) -> Self {
        Self {
            run_id,
            mode,
            bot_id,
            messages_sent: 0,
            samples_recorded: 0,
            dropped_malformed: 0,
            dropped_skewed: 0,
            interrupted: false,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the run as finished
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Wall-clock length of the run in seconds, if finished
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}
