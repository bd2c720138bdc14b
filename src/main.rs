//! Chat Latency Bot - Main CLI Application
//!
//! Connects to a chat server (TCP) or joins a multicast group, timestamps the
//! messages it sees and reports mean, median and p99 latency for the run.

use chat_latency_bot::{app::App, cli::Cli, error::ErrorReporter};
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    let result = match App::new(cli) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}
