//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::net::Ipv4Addr;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from .env file");
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "SERVER_HOST" => {
                if value.is_empty() {
                    return Err(AppError::config("SERVER_HOST cannot be empty"));
                }
            }
            "TCP_PORT" | "MCAST_PORT" => {
                let port: u16 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if port == 0 {
                    return Err(AppError::config(format!("{} must be between 1 and 65535", key)));
                }
            }
            "MCAST_GROUP" => {
                let group: Ipv4Addr = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid MCAST_GROUP value '{}': {}", value, e)))?;
                if !group.is_multicast() {
                    return Err(AppError::config(format!("MCAST_GROUP {} is not a multicast address", group)));
                }
            }
            "MCAST_INTERFACE" => {
                value.parse::<Ipv4Addr>()
                    .map_err(|e| AppError::config(format!("Invalid MCAST_INTERFACE value '{}': {}", value, e)))?;
            }
            "BUFFER_SIZE" => {
                let size: usize = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid BUFFER_SIZE value '{}': {}", value, e)))?;
                if !(crate::defaults::MIN_BUFFER_SIZE..=crate::defaults::MAX_BUFFER_SIZE).contains(&size) {
                    return Err(AppError::config(format!("BUFFER_SIZE out of range: {}", size)));
                }
            }
            "SEND_RATE" => {
                let rate: u32 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid SEND_RATE value '{}': {}", value, e)))?;
                if rate == 0 || rate > crate::defaults::MAX_SEND_RATE {
                    return Err(AppError::config(format!("SEND_RATE must be between 1 and {}, got: {}", crate::defaults::MAX_SEND_RATE, rate)));
                }
            }
            "RUN_DURATION" => {
                let secs: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid RUN_DURATION value '{}': {}", value, e)))?;
                if secs == 0 || secs > crate::defaults::MAX_DURATION_SECS {
                    return Err(AppError::config(format!("RUN_DURATION must be between 1 and {}, got: {}", crate::defaults::MAX_DURATION_SECS, secs)));
                }
            }
            "FRAMING" => {
                value.parse::<crate::types::Framing>()?;
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SERVER_HOST", "Chat server host", "127.0.0.1"),
            ("TCP_PORT", "Chat server TCP port", "8080"),
            ("MCAST_GROUP", "Multicast group address", "239.0.0.1"),
            ("MCAST_PORT", "Multicast UDP port", "8081"),
            ("MCAST_INTERFACE", "Interface used to join the group", "0.0.0.0"),
            ("BUFFER_SIZE", "Receive buffer size in bytes", "1024"),
            ("SEND_RATE", "Messages per second (stream mode)", "10"),
            ("RUN_DURATION", "Run length in seconds (stream mode)", "30"),
            ("FRAMING", "Stream framing (raw or line)", "raw"),
            ("RESULT_DIR", "Directory for result files", "/tmp"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(format!("Warning: {}", e));
                }
            }
        }

        warnings
    }
}
