//! Command-line interface

use crate::types::{Framing, Mode};
use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Chat Latency Bot - measures message latency over TCP or UDP multicast
#[derive(Parser, Debug, Clone)]
#[command(name = "latbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Transport to exercise: stream (TCP round trip) or multicast (one-way)
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Mode,

    /// Unique ID for this bot (message sender id and result file key)
    #[arg(long, default_value_t = 0)]
    pub id: u64,

    /// Messages per second (stream mode)
    #[arg(short, long, value_parser = parse_rate)]
    pub rate: Option<u32>,

    /// How long to run in seconds (stream mode; multicast runs until interrupted)
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: Option<u64>,

    /// Make this bot a message sender (stream mode)
    #[arg(short, long)]
    pub sender: bool,

    /// Chat server host
    #[arg(long)]
    pub host: Option<String>,

    /// Chat server TCP port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Multicast group to join
    #[arg(long)]
    pub group: Option<Ipv4Addr>,

    /// Multicast UDP port
    #[arg(long)]
    pub mcast_port: Option<u16>,

    /// Local interface address used to join the group
    #[arg(long)]
    pub interface: Option<Ipv4Addr>,

    /// Receive buffer size in bytes
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Stream framing: raw (one message per read) or line (newline-terminated)
    #[arg(long, value_parser = parse_framing)]
    pub framing: Option<Framing>,

    /// Directory for latency_result_<id>.txt
    #[arg(long, value_name = "DIR")]
    pub result_dir: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.json && self.verbose {
            return Err("--json cannot be combined with --verbose".to_string());
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse::<Mode>().map_err(|e| e.to_string())
}

fn parse_framing(s: &str) -> Result<Framing, String> {
    s.parse::<Framing>().map_err(|e| e.to_string())
}

/// Parse a send rate in messages per second
fn parse_rate(s: &str) -> Result<u32, String> {
    s.parse::<u32>()
        .map_err(|_| format!("Invalid rate: {}", s))
        .and_then(|rate| {
            if rate == 0 {
                Err("Rate must be greater than 0".to_string())
            } else if rate > crate::defaults::MAX_SEND_RATE {
                Err(format!("Rate cannot exceed {} messages/s", crate::defaults::MAX_SEND_RATE))
            } else {
                Ok(rate)
            }
        })
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > crate::defaults::MAX_DURATION_SECS {
                Err(format!("Duration cannot exceed {} seconds", crate::defaults::MAX_DURATION_SECS))
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    // Default to true on Unix-like systems, false on Windows
    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["latbot", "--mode", "stream"]);
        assert_eq!(cli.mode, Mode::Stream);
        assert_eq!(cli.id, 0);
        assert!(cli.rate.is_none());
        assert!(!cli.sender);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "latbot",
            "--mode", "tcp",
            "--id", "7",
            "--rate", "50",
            "--duration", "5",
            "--sender",
            "--host", "10.0.0.2",
            "--port", "9000",
            "--group", "239.1.2.3",
            "--mcast-port", "9001",
            "--interface", "127.0.0.1",
            "--buffer-size", "2048",
            "--framing", "line",
            "--result-dir", "/var/tmp",
            "--no-color",
            "--debug",
        ]);

        assert_eq!(cli.mode, Mode::Stream);
        assert_eq!(cli.id, 7);
        assert_eq!(cli.rate, Some(50));
        assert_eq!(cli.duration, Some(5));
        assert!(cli.sender);
        assert_eq!(cli.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.group, Some(Ipv4Addr::new(239, 1, 2, 3)));
        assert_eq!(cli.mcast_port, Some(9001));
        assert_eq!(cli.interface, Some(Ipv4Addr::LOCALHOST));
        assert_eq!(cli.buffer_size, Some(2048));
        assert_eq!(cli.framing, Some(Framing::Line));
        assert_eq!(cli.result_dir, Some(PathBuf::from("/var/tmp")));
        assert!(cli.no_color);
        assert!(cli.debug);
    }

    #[test]
    fn test_mode_is_required() {
        assert!(Cli::try_parse_from(["latbot"]).is_err());
        assert!(Cli::try_parse_from(["latbot", "--mode", "carrier-pigeon"]).is_err());
    }

    #[test]
    fn test_rate_parsing() {
        assert_eq!(parse_rate("10"), Ok(10));
        assert!(parse_rate("0").is_err());
        assert!(parse_rate("-1").is_err());
        assert!(parse_rate("10001").is_err());
        assert!(parse_rate("fast").is_err());
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("30"), Ok(30));
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("+5").is_err());
        assert!(parse_duration("0x10").is_err());
        assert!(parse_duration("86401").is_err());
    }

    #[test]
    fn test_cli_validation() {
        let cli = Cli::parse_from(["latbot", "--mode", "stream", "--color", "--no-color"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["latbot", "--mode", "stream", "--json", "--verbose"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["latbot", "--mode", "multicast"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_use_colors_method() {
        let cli = Cli::parse_from(["latbot", "--mode", "stream", "--color"]);
        assert!(cli.use_colors());

        let cli = Cli::parse_from(["latbot", "--mode", "stream", "--no-color"]);
        assert!(!cli.use_colors());
    }
}
