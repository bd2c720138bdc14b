//! Configuration validation utilities and rules

use crate::{
    models::Config,
    error::Result,
    types::{Framing, Mode},
};
use std::net::IpAddr;

/// Configuration validator producing non-fatal warnings on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        // Hard errors first
        config.validate()?;

        match config.mode {
            Mode::Stream => {
                warnings.extend(Self::validate_stream_settings(config));
            }
            Mode::Multicast => {
                warnings.extend(Self::validate_multicast_settings(config));
            }
        }
        warnings.extend(Self::validate_buffer_settings(config));

        Ok(warnings)
    }

    /// Checks specific to the TCP stream session
    fn validate_stream_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if !config.is_sender {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Bot {} is not a sender; it only records messages echoed by other senders",
                    config.bot_id
                ),
            ));
        }

        if config.is_sender && config.send_rate > 1000 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Send rate of {}/s is high; timer resolution may cap the effective rate",
                    config.send_rate
                ),
            ));
        }

        if config.is_sender {
            let expected = config.send_rate as u64 * config.duration_seconds;
            if expected > 1_000_000 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Run will send about {} messages and hold every sample in memory", expected),
                ));
            }
        }

        if config.framing == Framing::Raw && config.is_sender && config.send_rate > 100 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Raw framing at high rates loses coalesced messages; consider --framing line".to_string(),
            ));
        }

        if let Ok(ip) = config.server_host.parse::<IpAddr>() {
            if !ip.is_loopback() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Server {} is not on loopback; round trips include network time", ip),
                ));
            }
        }

        warnings
    }

    /// Checks specific to the multicast listener
    fn validate_multicast_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = vec![ValidationWarning::new(
            ValidationLevel::Warning,
            "Multicast latency is one-way and only meaningful when publisher and bot share a clock domain (same host)".to_string(),
        )];

        if config.is_sender {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "--sender is ignored in multicast mode".to_string(),
            ));
        }

        if config.duration_seconds != crate::defaults::DEFAULT_DURATION.as_secs() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Duration is ignored in multicast mode; the listener runs until interrupted".to_string(),
            ));
        }

        if is_local_network_control(config) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Group {} is in the local network control block (224.0.0.0/24)", config.multicast_group),
            ));
        }

        warnings
    }

    /// Checks on the receive buffer
    fn validate_buffer_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.buffer_size < 64 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Buffer size of {} bytes may truncate messages", config.buffer_size),
            ));
        }

        warnings
    }
}

fn is_local_network_control(config: &Config) -> bool {
    let octets = config.multicast_group.octets();
    octets[0] == 224 && octets[1] == 0 && octets[2] == 0
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Get color for terminal display
    pub fn color(&self) -> &'static str {
        match self {
            Self::Info => "blue",
            Self::Warning => "yellow",
            Self::Error => "red",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            format!("[{}] {}", self.level.as_str().color(self.level.color()).bold(), self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
