//! JSON report for scripted runs

use crate::{
    error::Result,
    models::{RunResult, RunSummary},
};
use super::formatter::{OutputFormatter, ReportData};
use serde::Serialize;

#[derive(Serialize)]
struct PercentileEntry {
    percentile: f64,
    value_us: f64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    run: &'a RunSummary,
    latency_kind: &'static str,
    result: Option<&'a RunResult>,
    record_line: Option<String>,
    percentiles: Vec<PercentileEntry>,
}

/// Formats the report as one pretty-printed JSON document
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, data: &ReportData<'_>) -> Result<String> {
        let report = JsonReport {
            run: data.summary,
            latency_kind: data.summary.mode.latency_kind(),
            result: data.result,
            record_line: data.result.map(RunResult::record_line),
            percentiles: data
                .percentiles
                .iter()
                .map(|&(percentile, value_us)| PercentileEntry { percentile, value_us })
                .collect(),
        };

        Ok(serde_json::to_string_pretty(&report)?)
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(serde_json::json!({ "warning": warning }).to_string())
    }
}
