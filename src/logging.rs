//! Structured logging for the latency bot
//!
//! Entries carry a level, the emitting component, the run id and free-form
//! fields. Normal runs print readable console lines; `--debug` switches to
//! one JSON object per line with source locations.
//!
//! Every entry goes to standard error so that standard output only carries
//! the run report.

use crate::error::AppError;
use crate::models::{Config, RunResult, RunSummary};
use crate::types::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug = 1,
    Info = 2,
    Warn = 3,
    /// Error events the run survives
    Error = 4,
    /// Errors that end the run
    Fatal = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// ANSI color for console output
    fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Fatal => "\x1b[35m",
        }
    }
}

const RESET_CODE: &str = "\x1b[0m";

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Emitting component, e.g. `NET` or `PERF`
    pub logger: String,
    /// Run id the entry belongs to
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
}

/// Logger for one component of a run. Cloning is cheap.
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    session_id: Option<String>,
}

impl Logger {
    /// Create a logger whose level and format follow the run flags
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            session_id: None,
        }
    }

    /// Create a configured logger already bound to a run id
    pub fn with_session(name: String, config: &Config, session_id: &str) -> Self {
        Self {
            session_id: Some(session_id.to_string()),
            ..Self::with_config(name, config)
        }
    }

    /// Derive a logger with another name for the same run
    pub fn named(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Write log entry to standard error
    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        if entry.correlation_id.is_none() {
            entry.correlation_id = self.session_id.clone();
        }

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => Self::format_json(&entry),
        };

        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, RESET_CODE)
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields_str: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields_str.sort();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add latency statistics
    pub fn latency(self, result: &RunResult) -> Self {
        self.field("samples", result.sample_count)
            .field("mean_us", result.mean_us)
            .field("median_us", result.median_us)
            .field("p99_us", result.p99_us)
            .field("min_us", result.min_us)
            .field("max_us", result.max_us)
    }

    /// Add error category and exit code
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_fatal", error.is_fatal())
            .field("error_exit_code", error.exit_code())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for stream and multicast session events
#[derive(Clone)]
pub struct SessionLogger {
    logger: Logger,
}

impl SessionLogger {
    /// Create a session logger outside of a run
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("NET".to_string(), config),
        }
    }

    /// Wrap an existing logger, keeping its run id
    pub fn from_logger(logger: &Logger) -> Self {
        Self {
            logger: logger.named("NET"),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn log_connection(&self, bot_id: u64, target: &str, success: bool, error: Option<&str>) {
        let level = if success { LogLevel::Info } else { LogLevel::Error };
        let message = if success {
            format!("Bot {} connected to {}", bot_id, target)
        } else {
            format!("Bot {} failed to connect to {}: {}", bot_id, target, error.unwrap_or("unknown error"))
        };

        let mut builder = self.logger.log(level, &message)
            .field("bot_id", bot_id)
            .field("target", target)
            .field("success", success);

        if let Some(err) = error {
            builder = builder.field("error", err);
        }

        builder.log().await;
    }

    pub async fn log_state_transition(&self, bot_id: u64, from: SessionState, to: SessionState) {
        self.logger.debug(&format!("Bot {} session {} -> {}", bot_id, from.as_str(), to.as_str()))
            .field("bot_id", bot_id)
            .field("from", from)
            .field("to", to)
            .log()
            .await;
    }

    pub async fn log_joined(&self, bot_id: u64, group: &str, port: u16, interface: &str) {
        self.logger.info(&format!("Bot {} subscribed to multicast group {}:{}", bot_id, group, port))
            .field("bot_id", bot_id)
            .field("group", group)
            .field("port", port)
            .field("interface", interface)
            .log()
            .await;
    }

    /// Log the one error that ends a send or receive loop
    pub async fn log_transport_error(&self, bot_id: u64, loop_name: &str, error: &AppError) {
        self.logger.error(&format!("Bot {} {} loop stopped: {}", bot_id, loop_name, error))
            .field("bot_id", bot_id)
            .field("loop", loop_name)
            .error_info(error)
            .log()
            .await;
    }

    pub async fn log_loop_finished(&self, bot_id: u64, loop_name: &str, count: u64) {
        self.logger.info(&format!("Bot {} {} loop finished after {} messages", bot_id, loop_name, count))
            .field("bot_id", bot_id)
            .field("loop", loop_name)
            .field("count", count)
            .log()
            .await;
    }

    /// Log dropped payload counters at the end of a session
    pub async fn log_dropped(&self, bot_id: u64, malformed: u64, skewed: u64, discarded_bytes: usize) {
        if malformed == 0 && skewed == 0 && discarded_bytes == 0 {
            return;
        }

        self.logger.debug(&format!(
            "Bot {} dropped {} malformed and {} skewed payloads", bot_id, malformed, skewed
        ))
            .field("bot_id", bot_id)
            .field("dropped_malformed", malformed)
            .field("dropped_skewed", skewed)
            .field("discarded_bytes", discarded_bytes)
            .log()
            .await;
    }
}

/// Performance timing logger for run phases
pub struct PerformanceLogger {
    logger: Logger,
    start_times: HashMap<String, DateTime<Utc>>,
}

impl PerformanceLogger {
    fn from_logger(logger: Logger) -> Self {
        Self {
            logger,
            start_times: HashMap::new(),
        }
    }

    pub async fn start_timing(&mut self, operation: &str) {
        let start_time = Utc::now();
        self.start_times.insert(operation.to_string(), start_time);

        self.logger.debug(&format!("Started timing: {}", operation))
            .field("operation", operation)
            .field("start_time", start_time)
            .log()
            .await;
    }

    /// End timing an operation and log the duration
    pub async fn end_timing(&mut self, operation: &str) -> Option<chrono::Duration> {
        let Some(start_time) = self.start_times.remove(operation) else {
            self.logger.warn(&format!("Attempted to end timing for unknown operation: {}", operation))
                .field("operation", operation)
                .log()
                .await;
            return None;
        };

        let end_time = Utc::now();
        let duration = end_time - start_time;

        self.logger.info(&format!("Completed timing: {} in {}ms", operation, duration.num_milliseconds()))
            .field("operation", operation)
            .field("start_time", start_time)
            .field("end_time", end_time)
            .field("duration_ms", duration.num_milliseconds())
            .log()
            .await;

        Some(duration)
    }

    /// Log the outcome of a run
    pub async fn log_run_summary(&self, summary: &RunSummary, result: Option<&RunResult>) {
        let message = match result {
            Some(result) => format!(
                "Bot {} {} run recorded {} samples, mean {:.2}us",
                summary.bot_id, summary.mode, result.sample_count, result.mean_us
            ),
            None => format!("Bot {} {} run recorded no samples", summary.bot_id, summary.mode),
        };

        let mut builder = self.logger.info(&message)
            .correlation_id(&summary.run_id)
            .field("mode", summary.mode)
            .field("bot_id", summary.bot_id)
            .field("messages_sent", summary.messages_sent)
            .field("dropped_malformed", summary.dropped_malformed)
            .field("dropped_skewed", summary.dropped_skewed)
            .field("interrupted", summary.interrupted)
            .field("elapsed_secs", summary.elapsed_secs());

        if let Some(result) = result {
            builder = builder.latency(result);
        }

        builder.log().await;
    }
}

/// Error event logger
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    /// Log an application error with its category and exit code
    pub async fn log_error(&self, error: &AppError, context: Option<&str>, correlation_id: Option<&str>) {
        let message = match context {
            Some(ctx) => format!("{}: {}", ctx, error),
            None => error.to_string(),
        };

        let level = if error.is_fatal() { LogLevel::Fatal } else { LogLevel::Error };
        let mut builder = self.logger.log(level, &message).error_info(error);

        if let Some(id) = correlation_id {
            builder = builder.correlation_id(id);
        }
        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }

        builder.log().await;
    }
}

/// Logger factory carrying the run id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    /// Create a new logger factory with a fresh run id
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn create_logger(&self, name: &str) -> Logger {
        Logger::with_session(name.to_string(), &self.config, &self.session_id)
    }

    pub fn create_session_logger(&self) -> SessionLogger {
        SessionLogger::from_logger(&self.create_logger("NET"))
    }

    pub fn create_performance_logger(&self) -> PerformanceLogger {
        PerformanceLogger::from_logger(self.create_logger("PERF"))
    }

    pub fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger {
            logger: self.create_logger("ERR"),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Log at info level with the caller's source location
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

/// Log at warn level with the caller's source location
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "Bot 1 connected".to_string(),
            logger: "NET".to_string(),
            correlation_id: Some("abcdef0123".to_string()),
            fields: HashMap::from([("bot_id".to_string(), serde_json::json!(1))]),
            location: None,
        }
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn test_logger_levels_follow_config() {
        let quiet = Logger::with_config("TEST".to_string(), &Config::default());
        assert!(!quiet.would_log(LogLevel::Info));
        assert!(quiet.would_log(LogLevel::Warn));

        let verbose = Config { verbose: true, ..Config::default() };
        let logger = Logger::with_config("TEST".to_string(), &verbose);
        assert!(logger.would_log(LogLevel::Info));
        assert!(!logger.would_log(LogLevel::Debug));

        let debug = Config { debug: true, enable_color: false, ..Config::default() };
        let logger = Logger::with_config("TEST".to_string(), &debug);
        assert!(logger.would_log(LogLevel::Debug));
        assert!(logger.include_location);
        assert_eq!(logger.format, LogFormat::Json);
        assert!(!logger.use_color);
    }

    #[test]
    fn test_named_logger_keeps_run_id() {
        let logger = Logger::with_session("APP".to_string(), &Config::default(), "run-1");
        let net = logger.named("NET");
        assert_eq!(net.name, "NET");
        assert_eq!(net.session_id.as_deref(), Some("run-1"));
    }

    #[test]
    fn test_console_format() {
        let config = Config { enable_color: false, ..Config::default() };
        let logger = Logger::with_config("NET".to_string(), &config);

        let output = logger.format_console(&sample_entry());
        assert!(output.contains(" INFO [NET] Bot 1 connected [abcdef01]"));
        assert!(output.contains("{bot_id=1}"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_json_format() {
        let parsed: serde_json::Value = serde_json::from_str(&Logger::format_json(&sample_entry())).unwrap();
        assert_eq!(parsed["message"], "Bot 1 connected");
        assert_eq!(parsed["level"], "Info");
        assert_eq!(parsed["fields"]["bot_id"], 1);
    }

    #[tokio::test]
    async fn test_session_logging_does_not_panic() {
        let config = Config { debug: true, ..Config::default() };
        let session = SessionLogger::new(&config);

        session.log_connection(1, "127.0.0.1:8080", true, None).await;
        session.log_connection(1, "127.0.0.1:8080", false, Some("Connection refused")).await;
        session.log_state_transition(1, SessionState::Connecting, SessionState::Connected).await;
        session.log_joined(1, "239.0.0.1", 8081, "0.0.0.0").await;
        session.log_transport_error(1, "receive", &AppError::transport("reset")).await;
        session.log_loop_finished(1, "send", 20).await;
        session.log_dropped(1, 2, 1, 0).await;
        crate::log_warn!(session.logger(), "bot {} idle", 1);
    }

    #[tokio::test]
    async fn test_performance_timing() {
        let factory = LoggerFactory::new(Config::default());
        let mut perf_logger = factory.create_performance_logger();

        perf_logger.start_timing("run").await;
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;

        let duration = perf_logger.end_timing("run").await;
        assert!(duration.unwrap().num_milliseconds() >= 0);
        assert!(perf_logger.end_timing("run").await.is_none());
    }

    #[tokio::test]
    async fn test_run_summary_logging() {
        let perf_logger = LoggerFactory::new(Config::default()).create_performance_logger();
        let mut summary = RunSummary::new("run-1".to_string(), crate::types::Mode::Stream, 3);
        summary.complete();

        let result = crate::stats::aggregate(&[100, 200, 300]);
        perf_logger.log_run_summary(&summary, result.as_ref()).await;
        perf_logger.log_run_summary(&summary, None).await;
    }

    #[tokio::test]
    async fn test_logger_factory() {
        let factory = LoggerFactory::new(Config::default());
        assert_eq!(factory.session_id().len(), 36);

        let logger = factory.create_logger("APP");
        assert_eq!(logger.name, "APP");
        assert_eq!(logger.session_id.as_deref(), Some(factory.session_id()));

        assert_eq!(factory.create_session_logger().logger().name, "NET");
        assert_eq!(factory.create_performance_logger().logger.name, "PERF");

        let err_logger = factory.create_error_logger();
        err_logger.log_error(&AppError::bind("in use"), Some("joining group"), None).await;
    }

    #[test]
    fn test_log_entry_serialization() {
        let entry = LogEntry {
            level: LogLevel::Warn,
            location: Some(LogLocation { file: "x.rs".to_string(), line: 4, module: None }),
            ..sample_entry()
        };

        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: LogEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.level, LogLevel::Warn);
        assert_eq!(deserialized.location.unwrap().line, 4);
    }
}
