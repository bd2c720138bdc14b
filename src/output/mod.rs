//! Run output: the persisted result record and the console report
//!
//! [`ResultWriter`] owns the one-line `mean,median,p99` file that harness
//! scripts collect. [`ConsoleReport`] renders the human or JSON report
//! through an [`OutputFormatter`].

mod colored;
mod formatter;
mod json;

pub use colored::{ColorScheme, ColoredFormatter, LatencyLevel};
pub use formatter::{FormattingOptions, OutputFormatter, PlainFormatter, ReportData};
pub use json::JsonFormatter;

use crate::{
    error::{AppError, Result},
    models::{Config, RunResult},
};
use std::path::{Path, PathBuf};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool, json: bool) -> Box<dyn OutputFormatter> {
        if json {
            return Box::new(JsonFormatter);
        }

        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    pub fn from_config(config: &Config) -> Box<dyn OutputFormatter> {
        Self::create_formatter(config.enable_color, config.verbose || config.debug, config.json_output)
    }
}

/// Console report printed at the end of a run
pub struct ConsoleReport {
    formatter: Box<dyn OutputFormatter>,
}

impl ConsoleReport {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(OutputFormatterFactory::from_config(config))
    }

    /// Render the report text
    pub fn render(&self, data: &ReportData<'_>) -> Result<String> {
        self.formatter.format_report(data)
    }

    /// Render and print the report on standard output
    pub fn print(&self, data: &ReportData<'_>) -> Result<()> {
        println!("{}", self.render(data)?);
        Ok(())
    }

    /// Render a one-line warning in the report's format
    pub fn warning(&self, message: &str) -> Result<String> {
        self.formatter.format_warning(message)
    }
}

/// Writes `latency_result_<id>.txt` files
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the result file for a bot
    pub fn path_for(&self, bot_id: u64) -> PathBuf {
        self.dir.join(crate::defaults::result_file_name(bot_id))
    }

    /// Write the record line, replacing any previous result for the bot
    pub fn write(&self, bot_id: u64, result: &RunResult) -> Result<PathBuf> {
        let path = self.path_for(bot_id);
        let content = format!("{}\n", result.record_line());

        std::fs::write(&path, content)
            .map_err(|e| AppError::io(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunSummary;
    use crate::types::Mode;
    use tempfile::TempDir;

    #[test]
    fn test_path_for_uses_bot_id() {
        let writer = ResultWriter::new("/tmp");
        assert_eq!(writer.path_for(7), PathBuf::from("/tmp/latency_result_7.txt"));
        assert_eq!(writer.dir(), Path::new("/tmp"));
    }

    #[test]
    fn test_write_record_line() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path());
        let result = crate::stats::aggregate(&[500]).unwrap();

        let path = writer.write(3, &result).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "500.00,500.00,500.00\n");
    }

    #[test]
    fn test_write_truncates_previous_result() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path());

        std::fs::write(writer.path_for(1), "stale,stale,stale\nmore\n").unwrap();
        let result = crate::stats::aggregate(&[100, 300]).unwrap();
        writer.write(1, &result).unwrap();

        let content = std::fs::read_to_string(writer.path_for(1)).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("200.00,200.00,"));
    }

    #[test]
    fn test_write_to_missing_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path().join("missing"));
        let result = crate::stats::aggregate(&[1]).unwrap();

        let err = writer.write(1, &result).unwrap_err();
        assert_eq!(err.category(), "IO");
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_factory_picks_json() {
        let config = Config { json_output: true, ..Config::default() };
        let report = ConsoleReport::from_config(&config);
        let summary = RunSummary::new("id".to_string(), Mode::Stream, 0);
        let data = ReportData { summary: &summary, result: None, percentiles: &[] };

        let rendered = report.render(&data).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&rendered).is_ok());
    }

    #[test]
    fn test_warning_follows_report_format() {
        let plain = ConsoleReport::new(OutputFormatterFactory::create_formatter(false, false, false));
        assert_eq!(plain.warning("Run interrupted").unwrap(), "Warning: Run interrupted");

        let json = ConsoleReport::new(OutputFormatterFactory::create_formatter(false, false, true));
        let value: serde_json::Value = serde_json::from_str(&json.warning("Run interrupted").unwrap()).unwrap();
        assert_eq!(value["warning"], "Run interrupted");
    }
}
