//! Core formatting trait and the plain text implementation

use crate::{
    error::Result,
    models::{RunResult, RunSummary},
};
use std::fmt::Write as _;

/// Everything a report is rendered from
#[derive(Debug, Clone, Copy)]
pub struct ReportData<'a> {
    pub summary: &'a RunSummary,
    pub result: Option<&'a RunResult>,
    /// `(percentile, value_us)` pairs for the detailed view
    pub percentiles: &'a [(f64, f64)],
}

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format the end-of-run report
    fn format_report(&self, data: &ReportData<'_>) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Add percentile table, drop counters and timing
    pub verbose_mode: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
        }
    }
}

/// Plain text formatter
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub(crate) fn format_details(data: &ReportData<'_>) -> String {
        let mut output = String::new();
        let summary = data.summary;

        let _ = writeln!(output, "Messages sent: {}", summary.messages_sent);
        let _ = writeln!(
            output,
            "Dropped: {} malformed, {} skewed",
            summary.dropped_malformed, summary.dropped_skewed
        );
        if let Some(elapsed) = summary.elapsed_secs() {
            let _ = writeln!(output, "Elapsed: {:.1} s", elapsed);
        }
        if let Some(result) = data.result {
            let _ = writeln!(output, "Std Dev: {:.2} µs", result.std_dev_us);
        }
        if !data.percentiles.is_empty() {
            output.push_str("Percentiles:\n");
            for (p, value) in data.percentiles {
                let _ = writeln!(output, "  p{:<5} {:>12.2} µs", p, value);
            }
        }

        output
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_report(&self, data: &ReportData<'_>) -> Result<String> {
        let mut output = String::new();
        let summary = data.summary;

        let _ = writeln!(output, "\n--- Bot {} Stats ---", summary.bot_id);
        let _ = writeln!(output, "Latency: {}", summary.mode.latency_kind());
        if summary.interrupted {
            output.push_str("Run interrupted\n");
        }

        match data.result {
            Some(result) => {
                let _ = writeln!(output, "Messages recorded: {}", result.sample_count);
                let _ = writeln!(output, "Avg Latency: {:.2} µs", result.mean_us);
                let _ = writeln!(output, "Median Latency: {:.2} µs", result.median_us);
                let _ = writeln!(output, "P99 Latency: {:.2} µs", result.p99_us);
                let _ = writeln!(output, "Min/Max: {:.2} / {:.2} µs", result.min_us, result.max_us);
            }
            None => {
                output.push_str("Messages recorded: 0\n");
                output.push_str("No latency samples; no result file written\n");
            }
        }

        if self.options.verbose_mode {
            output.push_str(&Self::format_details(data));
        }

        Ok(output)
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("Warning: {}", warning))
    }
}
