//! Colored formatter with latency-level color coding

use crate::error::Result;
use super::formatter::{FormattingOptions, OutputFormatter, PlainFormatter, ReportData};
use colored::*;
use std::fmt::Write as _;

/// Latency classification for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatencyLevel {
    Excellent,  // < 100µs
    Good,       // 100µs-1ms
    Fair,       // 1-10ms
    Poor,       // 10-100ms
    VeryPoor,   // > 100ms
}

impl LatencyLevel {
    /// Classify a latency in microseconds
    pub fn from_micros(latency_us: f64) -> Self {
        if latency_us < 100.0 {
            Self::Excellent
        } else if latency_us < 1_000.0 {
            Self::Good
        } else if latency_us < 10_000.0 {
            Self::Fair
        } else if latency_us < 100_000.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub warning: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            warning: Color::Yellow,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    fn latency_value(&self, latency_us: f64) -> ColoredString {
        format!("{:.2} µs", latency_us).color(LatencyLevel::from_micros(latency_us).color())
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_report(&self, data: &ReportData<'_>) -> Result<String> {
        let mut output = String::new();
        let summary = data.summary;

        let header = format!("--- Bot {} Stats ---", summary.bot_id);
        let _ = writeln!(output, "\n{}", header.color(self.color_scheme.header).bold());
        let _ = writeln!(
            output,
            "{} {}",
            "Latency:".color(self.color_scheme.muted),
            summary.mode.latency_kind()
        );
        if summary.interrupted {
            let _ = writeln!(output, "{}", "Run interrupted".color(self.color_scheme.warning));
        }

        match data.result {
            Some(result) => {
                let _ = writeln!(output, "Messages recorded: {}", result.sample_count.to_string().bold());
                let _ = writeln!(output, "Avg Latency: {}", self.latency_value(result.mean_us));
                let _ = writeln!(output, "Median Latency: {}", self.latency_value(result.median_us));
                let _ = writeln!(output, "P99 Latency: {}", self.latency_value(result.p99_us));
                let _ = writeln!(
                    output,
                    "Min/Max: {} / {}",
                    self.latency_value(result.min_us),
                    self.latency_value(result.max_us)
                );
                let level = LatencyLevel::from_micros(result.median_us);
                let _ = writeln!(output, "Rating: {}", level.description().color(level.color()).bold());
            }
            None => {
                output.push_str("Messages recorded: 0\n");
                let _ = writeln!(
                    output,
                    "{}",
                    "No latency samples; no result file written".color(self.color_scheme.warning)
                );
            }
        }

        if self.options.verbose_mode {
            let details = PlainFormatter::format_details(data);
            let _ = write!(output, "{}", details.color(self.color_scheme.muted));
        }

        Ok(output)
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", "Warning:".color(self.color_scheme.warning).bold(), warning))
    }
}
