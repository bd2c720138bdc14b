//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    models::Config,
    error::Result,
    config::env::EnvManager,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        self.load_env_file()?;

        if self.cli.debug {
            for warning in EnvManager::validate_current_env() {
                eprintln!("{}", warning);
            }
        }

        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Load .env file if it exists
    fn load_env_file(&self) -> Result<()> {
        EnvManager::load_env_file(self.cli.debug)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        config.mode = cli.mode;
        config.bot_id = cli.id;
        config.is_sender = cli.sender;

        if let Some(rate) = cli.rate {
            config.send_rate = rate;
        }
        if let Some(duration) = cli.duration {
            config.duration_seconds = duration;
        }
        if let Some(ref host) = cli.host {
            config.server_host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server_port = port;
        }
        if let Some(group) = cli.group {
            config.multicast_group = group;
        }
        if let Some(port) = cli.mcast_port {
            config.multicast_port = port;
        }
        if let Some(interface) = cli.interface {
            config.multicast_interface = interface;
        }
        if let Some(size) = cli.buffer_size {
            config.buffer_size = size;
        }
        if let Some(framing) = cli.framing {
            config.framing = framing;
        }
        if let Some(ref dir) = cli.result_dir {
            config.result_dir = dir.clone();
        }

        if cli.color {
            config.enable_color = true;
        } else if cli.no_color || !cli.use_colors() {
            config.enable_color = false;
        }

        // CLI-only flags
        config.json_output = cli.json;
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Mode: {}", config.mode));
    summary.push(format!("Bot ID: {}", config.bot_id));
    summary.push(format!("Server: {}", config.server_addr()));
    summary.push(format!("Multicast: {}:{} via {}", config.multicast_group, config.multicast_port, config.multicast_interface));
    summary.push(format!("Sender: {}", config.is_sender));
    summary.push(format!("Rate: {}/s", config.send_rate));
    summary.push(format!("Duration: {}s", config.duration_seconds));
    summary.push(format!("Buffer Size: {} bytes", config.buffer_size));
    summary.push(format!("Framing: {}", config.framing));
    summary.push(format!("Result Dir: {}", config.result_dir.display()));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
