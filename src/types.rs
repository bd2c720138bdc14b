//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Transport exercised by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Point-to-point TCP session, round-trip latency
    Stream,
    /// UDP multicast feed, one-way latency
    Multicast,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Stream => "stream",
            Mode::Multicast => "multicast",
        }
    }

    /// Label of the latency measured in this mode
    pub fn latency_kind(&self) -> &'static str {
        match self {
            Mode::Stream => "round-trip",
            Mode::Multicast => "one-way (same-host clock domain)",
        }
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stream" | "tcp" => Ok(Mode::Stream),
            "multicast" | "mcast" => Ok(Mode::Multicast),
            _ => Err(AppError::parse(format!("Invalid mode '{}', expected stream or multicast", s))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message boundary convention on the stream transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// One message per read, no terminator
    #[default]
    Raw,
    /// Newline-terminated messages, reassembled across reads
    Line,
}

impl Framing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framing::Raw => "raw",
            Framing::Line => "line",
        }
    }
}

impl FromStr for Framing {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raw" | "none" => Ok(Framing::Raw),
            "line" | "newline" => Ok(Framing::Line),
            _ => Err(AppError::parse(format!("Invalid framing '{}', expected raw or line", s))),
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Connecting,
    Connected,
    /// Send and receive loops running
    Running,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Running => "running",
            SessionState::Closed => "closed",
        }
    }
}
