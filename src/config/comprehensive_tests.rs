//! Additional comprehensive tests for configuration parsing and validation

use super::{ConfigParser, EnvManager, ENV_LOCK};
use crate::{
    cli::Cli,
    models::Config,
    types::Mode,
};
use clap::Parser;
use std::env;
use std::net::Ipv4Addr;
use std::path::PathBuf;

fn clear_env() {
    for (var, _, _) in EnvManager::get_supported_env_vars() {
        env::remove_var(var);
    }
}

/// Test edge cases in configuration values
mod config_edge_cases {
    use super::*;

    #[test]
    fn test_config_at_upper_bounds() {
        let mut config = Config::default();
        config.send_rate = crate::defaults::MAX_SEND_RATE;
        config.duration_seconds = crate::defaults::MAX_DURATION_SECS;
        config.buffer_size = crate::defaults::MAX_BUFFER_SIZE;
        assert!(config.validate().is_ok());

        config.send_rate += 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_at_lower_bounds() {
        let mut config = Config::default();
        config.send_rate = 1;
        config.duration_seconds = 1;
        config.buffer_size = crate::defaults::MIN_BUFFER_SIZE;
        assert!(config.validate().is_ok());

        config.buffer_size -= 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multicast_group_range_edges() {
        let mut config = Config { mode: Mode::Multicast, ..Config::default() };

        config.multicast_group = Ipv4Addr::new(224, 0, 0, 0);
        assert!(config.validate().is_ok());

        config.multicast_group = Ipv4Addr::new(239, 255, 255, 255);
        assert!(config.validate().is_ok());

        config.multicast_group = Ipv4Addr::new(223, 255, 255, 255);
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), "BIND");
        assert_eq!(err.exit_code(), 3);

        config.multicast_group = Ipv4Addr::new(240, 0, 0, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_group_ignored_in_stream_mode() {
        let config = Config {
            mode: Mode::Stream,
            multicast_group: Ipv4Addr::new(10, 0, 0, 1),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hostname_is_accepted() {
        let mut config = Config::default();
        config.server_host = "chat-server.internal".to_string();
        assert!(config.validate().is_ok());
    }
}

/// Test environment variable layering
mod env_layering_tests {
    use super::*;

    #[test]
    fn test_env_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("SERVER_HOST", "10.9.8.7");
        env::set_var("MCAST_GROUP", "239.5.5.5");
        env::set_var("MCAST_INTERFACE", "127.0.0.1");
        env::set_var("BUFFER_SIZE", "4096");
        env::set_var("RUN_DURATION", "12");
        env::set_var("FRAMING", "line");
        env::set_var("RESULT_DIR", "/var/tmp/bots");
        env::set_var("ENABLE_COLOR", "false");

        let mut config = Config::default();
        config.merge_from_env().unwrap();
        clear_env();

        assert_eq!(config.server_host, "10.9.8.7");
        assert_eq!(config.multicast_group, Ipv4Addr::new(239, 5, 5, 5));
        assert_eq!(config.multicast_interface, Ipv4Addr::LOCALHOST);
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.duration_seconds, 12);
        assert_eq!(config.framing, crate::types::Framing::Line);
        assert_eq!(config.result_dir, PathBuf::from("/var/tmp/bots"));
        assert!(!config.enable_color);
    }

    #[test]
    fn test_blank_host_and_dir_keep_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("SERVER_HOST", "   ");
        env::set_var("RESULT_DIR", "");

        let mut config = Config::default();
        config.merge_from_env().unwrap();
        clear_env();

        assert_eq!(config.server_host, crate::defaults::DEFAULT_SERVER_HOST);
        assert_eq!(config.result_dir, std::env::temp_dir());
    }

    #[test]
    fn test_cli_beats_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("MCAST_PORT", "9999");
        env::set_var("FRAMING", "line");

        let cli = Cli::parse_from([
            "latbot", "--mode", "mcast", "--mcast-port", "7777", "--framing", "raw",
        ]);
        let config = ConfigParser::new(cli).parse();
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.mode, Mode::Multicast);
        assert_eq!(config.multicast_port, 7777);
        assert_eq!(config.framing, crate::types::Framing::Raw);
    }

    #[test]
    fn test_validate_current_env_reports_bad_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("SEND_RATE", "lots");
        let warnings = EnvManager::validate_current_env();
        clear_env();

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("SEND_RATE"));
    }

    #[test]
    fn test_out_of_range_env_rate_fails_validation() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        env::set_var("SEND_RATE", "20000");
        let cli = Cli::parse_from(["latbot", "--mode", "stream"]);
        let result = ConfigParser::new(cli).parse();
        clear_env();

        assert!(result.is_err());
    }
}
