//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, ValidationLevel},
    error::{AppError, Result},
    logging::{Logger, LoggerFactory},
    models::{Config, RunResult, RunSummary},
    output::{ConsoleReport, ReportData, ResultWriter},
    sink::LatencySink,
    stats::LatencyAggregator,
    transport::{MulticastListener, StreamOptions, StreamSession},
    types::Mode,
};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance, rejecting conflicting flags
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::validation)?;
        Ok(Self { cli })
    }

    /// Load configuration, run the measurement, print and persist the result
    pub async fn run(self) -> Result<()> {
        let config = load_config(self.cli)?;

        if config.debug {
            eprintln!("{}", build_banner());
            eprintln!("\nConfiguration Summary:\n{}\n", display_config_summary(&config));
        }

        for warning in validate_config(&config)? {
            if warning.level != ValidationLevel::Info || config.verbose || config.debug {
                eprintln!("{}", warning.format(config.enable_color));
            }
        }

        let report = ConsoleReport::from_config(&config);
        let writer = ResultWriter::new(config.result_dir.clone());
        let bot_id = config.bot_id;
        let debug = config.debug;

        let run = Run::new(config);
        let app_logger = run.logger("APP");
        let outcome = run.execute().await?;

        if outcome.summary.interrupted {
            eprintln!("\n{}", report.warning("Run interrupted, reporting samples recorded so far")?);
        }

        // An unwritable result file still gets the console report first.
        let written = outcome
            .result
            .as_ref()
            .map(|result| writer.write(bot_id, result))
            .transpose();

        report.print(&outcome.report_data())?;

        match written {
            Ok(Some(path)) => {
                crate::log_info!(app_logger, "Result written to {}", path.display());
                Ok(())
            }
            Ok(None) => {
                crate::log_info!(app_logger, "No samples recorded, {} not written", writer.path_for(bot_id).display());
                Ok(())
            }
            Err(e) => {
                if debug {
                    app_logger.error("Result file write failed").error_info(&e).log().await;
                }
                Err(e)
            }
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub result: Option<RunResult>,
    pub percentiles: Vec<(f64, f64)>,
}

impl RunOutcome {
    pub fn report_data(&self) -> ReportData<'_> {
        ReportData {
            summary: &self.summary,
            result: self.result.as_ref(),
            percentiles: &self.percentiles,
        }
    }
}

/// One measurement run.
///
/// Owns the latency sink and the cancellation token. Every loop it starts is
/// joined before the sink is read, so the samples are final when aggregated.
pub struct Run {
    config: Config,
    sink: LatencySink,
    cancel: CancellationToken,
    loggers: LoggerFactory,
}

impl Run {
    pub fn new(config: Config) -> Self {
        let loggers = LoggerFactory::new(config.clone());
        Self {
            config,
            sink: LatencySink::new(),
            cancel: CancellationToken::new(),
            loggers,
        }
    }

    pub fn run_id(&self) -> &str {
        self.loggers.session_id()
    }

    /// Token that stops the run the same way an interrupt does
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn logger(&self, name: &str) -> Logger {
        self.loggers.create_logger(name)
    }

    /// Measure until done or interrupted by Ctrl-C, then aggregate
    pub async fn execute(self) -> Result<RunOutcome> {
        self.execute_until(async {
            // A failing handler install means no interrupt can ever arrive.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Measure until done or until `interrupt` resolves, then aggregate.
    ///
    /// On interrupt the token is cancelled and the loops still run to
    /// completion, so samples recorded so far are kept.
    pub async fn execute_until<F>(self, interrupt: F) -> Result<RunOutcome>
    where
        F: Future<Output = ()>,
    {
        let mut summary = RunSummary::new(self.run_id().to_string(), self.config.mode, self.config.bot_id);
        let mut perf = self.loggers.create_performance_logger();
        perf.start_timing("measurement").await;

        let measurement = self.measure();
        tokio::pin!(measurement);
        tokio::pin!(interrupt);

        let measured = tokio::select! {
            measured = &mut measurement => measured,
            _ = &mut interrupt => {
                summary.interrupted = true;
                self.cancel.cancel();
                measurement.await
            }
        };

        perf.end_timing("measurement").await;

        let messages_sent = match measured {
            Ok(sent) => sent,
            Err(e) => {
                if self.config.debug {
                    self.loggers
                        .create_error_logger()
                        .log_error(&e, Some("measurement"), Some(self.run_id()))
                        .await;
                }
                return Err(e);
            }
        };

        let dropped = self.sink.dropped();
        let samples = self.sink.take();

        summary.messages_sent = messages_sent;
        summary.samples_recorded = samples.len();
        summary.dropped_malformed = dropped.malformed;
        summary.dropped_skewed = dropped.skewed;
        summary.complete();

        let aggregator = LatencyAggregator::with_defaults();
        let result = aggregator.aggregate(&samples);
        let percentiles = if self.config.verbose || self.config.debug || self.config.json_output {
            aggregator.percentile_table(&samples)
        } else {
            Vec::new()
        };

        perf.log_run_summary(&summary, result.as_ref()).await;

        Ok(RunOutcome {
            summary,
            result,
            percentiles,
        })
    }

    /// Run the configured transport; returns the number of messages sent
    async fn measure(&self) -> Result<u64> {
        match self.config.mode {
            Mode::Stream => self.measure_stream().await,
            Mode::Multicast => self.measure_multicast().await,
        }
    }

    async fn measure_stream(&self) -> Result<u64> {
        let config = &self.config;
        let connect = StreamSession::connect(
            &config.server_host,
            config.server_port,
            config.bot_id,
            self.loggers.create_session_logger(),
        );

        // An interrupt while the connect is pending ends the run without samples.
        let session = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(0),
            session = connect => session?,
        };

        let options = StreamOptions::from_config(config);
        let report = session.run(&options, self.sink.clone(), self.cancel.clone()).await?;

        Ok(report.messages_sent)
    }

    async fn measure_multicast(&self) -> Result<u64> {
        let config = &self.config;
        let listener = MulticastListener::join(
            config.multicast_group,
            config.multicast_port,
            config.multicast_interface,
            config.bot_id,
            self.loggers.create_session_logger(),
        )
        .await?;

        let receive_task = tokio::spawn(listener.run(
            config.buffer_size,
            self.sink.clone(),
            self.cancel.clone(),
        ));
        receive_task.await?;

        Ok(0)
    }
}

/// Version and build information shown in debug mode
pub fn build_banner() -> String {
    let mut banner = format!("{} v{}", crate::PKG_NAME, crate::VERSION);
    if let Some(commit) = option_env!("GIT_COMMIT") {
        banner.push_str(&format!(" ({})", commit));
    }
    if let Some(target) = option_env!("TARGET_TRIPLE") {
        banner.push_str(&format!(" [{}]", target));
    }
    if let Some(built) = option_env!("BUILD_TIME") {
        banner.push_str(&format!(" built {}", built));
    }
    banner
}
