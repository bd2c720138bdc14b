//! Configuration data model and validation

use crate::types::{AppError, Framing, Mode, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transport to exercise
    #[serde(default = "default_mode")]
    pub mode: Mode,

    /// Bot identifier, used as the message sender id and result file key
    #[serde(default)]
    pub bot_id: u64,

    /// Messages per second (stream sender only)
    #[serde(default = "default_send_rate")]
    pub send_rate: u32,

    /// Run length in seconds (stream mode only)
    #[serde(default = "default_duration_secs")]
    pub duration_seconds: u64,

    /// Whether this bot sends messages (stream mode only)
    #[serde(default)]
    pub is_sender: bool,

    /// Chat server host
    #[serde(default = "default_server_host")]
    pub server_host: String,

    /// Chat server TCP port
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Multicast group address
    #[serde(default = "default_multicast_group")]
    pub multicast_group: Ipv4Addr,

    /// Multicast UDP port
    #[serde(default = "default_multicast_port")]
    pub multicast_port: u16,

    /// Local interface used to join the group
    #[serde(default = "default_multicast_interface")]
    pub multicast_interface: Ipv4Addr,

    /// Size of a single receive
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Message boundary convention on the stream transport
    #[serde(default)]
    pub framing: Framing,

    /// Directory receiving `latency_result_<id>.txt`
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,

    /// Print the result as JSON instead of the text report
    #[serde(default)]
    pub json_output: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            bot_id: 0,
            send_rate: default_send_rate(),
            duration_seconds: default_duration_secs(),
            is_sender: false,
            server_host: default_server_host(),
            server_port: default_server_port(),
            multicast_group: default_multicast_group(),
            multicast_port: default_multicast_port(),
            multicast_interface: default_multicast_interface(),
            buffer_size: default_buffer_size(),
            framing: Framing::default(),
            result_dir: default_result_dir(),
            json_output: false,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Run length as Duration
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }

    /// Pause between two sends to hold the configured rate
    pub fn send_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.send_rate.max(1) as f64)
    }

    /// `host:port` of the chat server
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        use crate::defaults::*;

        if self.server_host.trim().is_empty() {
            return Err(AppError::config("Server host cannot be empty"));
        }

        if self.server_port == 0 {
            return Err(AppError::config("Server port must be greater than 0"));
        }

        // Joining a unicast address is a bind failure, reported before the run.
        if self.mode == Mode::Multicast && !self.multicast_group.is_multicast() {
            return Err(AppError::bind(format!(
                "Multicast group {} is not a multicast address (224.0.0.0/4)",
                self.multicast_group
            )));
        }

        if self.multicast_port == 0 {
            return Err(AppError::config("Multicast port must be greater than 0"));
        }

        if self.send_rate == 0 {
            return Err(AppError::config("Send rate must be greater than 0"));
        }

        if self.send_rate > MAX_SEND_RATE {
            return Err(AppError::config(format!("Send rate cannot exceed {} messages/s", MAX_SEND_RATE)));
        }

        if self.duration_seconds == 0 {
            return Err(AppError::config("Duration must be greater than 0"));
        }

        if self.duration_seconds > MAX_DURATION_SECS {
            return Err(AppError::config(format!("Duration cannot exceed {} seconds", MAX_DURATION_SECS)));
        }

        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(AppError::config(format!(
                "Buffer size must be between {} and {} bytes, got {}",
                MIN_BUFFER_SIZE, MAX_BUFFER_SIZE, self.buffer_size
            )));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            let host = host.trim();
            if !host.is_empty() {
                self.server_host = host.to_string();
            }
        }

        if let Ok(port) = std::env::var("TCP_PORT") {
            self.server_port = port.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TCP_PORT value '{}': {}", port, e)))?;
        }

        if let Ok(group) = std::env::var("MCAST_GROUP") {
            self.multicast_group = group.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid MCAST_GROUP value '{}': {}", group, e)))?;
        }

        if let Ok(port) = std::env::var("MCAST_PORT") {
            self.multicast_port = port.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid MCAST_PORT value '{}': {}", port, e)))?;
        }

        if let Ok(interface) = std::env::var("MCAST_INTERFACE") {
            self.multicast_interface = interface.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid MCAST_INTERFACE value '{}': {}", interface, e)))?;
        }

        if let Ok(size) = std::env::var("BUFFER_SIZE") {
            self.buffer_size = size.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid BUFFER_SIZE value '{}': {}", size, e)))?;
        }

        if let Ok(rate) = std::env::var("SEND_RATE") {
            self.send_rate = rate.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid SEND_RATE value '{}': {}", rate, e)))?;
        }

        if let Ok(duration) = std::env::var("RUN_DURATION") {
            self.duration_seconds = duration.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid RUN_DURATION value '{}': {}", duration, e)))?;
        }

        if let Ok(framing) = std::env::var("FRAMING") {
            self.framing = framing.trim().parse()
                .map_err(|e: AppError| AppError::config(format!("Invalid FRAMING value: {}", e)))?;
        }

        if let Ok(dir) = std::env::var("RESULT_DIR") {
            let dir = dir.trim();
            if !dir.is_empty() {
                self.result_dir = PathBuf::from(dir);
            }
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_mode() -> Mode {
    Mode::Stream
}

fn default_send_rate() -> u32 {
    crate::defaults::DEFAULT_SEND_RATE
}

fn default_duration_secs() -> u64 {
    crate::defaults::DEFAULT_DURATION.as_secs()
}

fn default_server_host() -> String {
    crate::defaults::DEFAULT_SERVER_HOST.to_string()
}

fn default_server_port() -> u16 {
    crate::defaults::DEFAULT_SERVER_PORT
}

fn default_multicast_group() -> Ipv4Addr {
    crate::defaults::DEFAULT_MULTICAST_GROUP
}

fn default_multicast_port() -> u16 {
    crate::defaults::DEFAULT_MULTICAST_PORT
}

fn default_multicast_interface() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

fn default_buffer_size() -> usize {
    crate::defaults::DEFAULT_BUFFER_SIZE
}

fn default_result_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
