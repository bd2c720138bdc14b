//! Latency aggregation: mean, median and p99 over a run's samples

use crate::models::RunResult;

/// Configuration for statistical calculations
#[derive(Debug, Clone)]
pub struct StatisticsConfig {
    /// Additional percentiles shown in the verbose report (e.g. 90th, 95th)
    pub percentiles: Vec<f64>,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            percentiles: vec![50.0, 90.0, 95.0, 99.0, 99.9],
        }
    }
}

/// Turns the samples of a finished run into a [`RunResult`]
#[derive(Debug, Clone, Default)]
pub struct LatencyAggregator {
    config: StatisticsConfig,
}

impl LatencyAggregator {
    /// Create a new aggregator
    pub fn new(config: StatisticsConfig) -> Self {
        Self { config }
    }

    /// Create an aggregator with default configuration
    pub fn with_defaults() -> Self {
        Self::new(StatisticsConfig::default())
    }

    /// Aggregate the samples. An empty run yields `None`: no result record
    /// and nothing to persist.
    pub fn aggregate(&self, samples: &[u64]) -> Option<RunResult> {
        if samples.is_empty() {
            return None;
        }

        let sorted = sorted_values(samples);
        let count = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / count;

        Some(RunResult {
            sample_count: sorted.len(),
            mean_us: mean,
            median_us: percentile(&sorted, 50.0),
            p99_us: percentile(&sorted, 99.0),
            min_us: sorted[0],
            max_us: sorted[sorted.len() - 1],
            std_dev_us: standard_deviation(&sorted, mean),
        })
    }

    /// The configured percentiles as `(percentile, value)` pairs
    pub fn percentile_table(&self, samples: &[u64]) -> Vec<(f64, f64)> {
        if samples.is_empty() {
            return Vec::new();
        }

        let sorted = sorted_values(samples);
        self.config
            .percentiles
            .iter()
            .map(|&p| (p, percentile(&sorted, p)))
            .collect()
    }
}

/// Convenience function: aggregate with default configuration
pub fn aggregate(samples: &[u64]) -> Option<RunResult> {
    LatencyAggregator::with_defaults().aggregate(samples)
}

fn sorted_values(samples: &[u64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    sorted.into_iter().map(|v| v as f64).collect()
}

/// Percentile by the exclusive method: the rank is `p/100 * (n+1)`,
/// interpolated between the two nearest order statistics. Ranks outside
/// `[1, n-1]` extend the first or last segment, so p99 of a small run may lie
/// past the largest sample. A single sample is every percentile of itself.
///
/// At whole percentiles this matches the 100-quantile cut points of the
/// result files written by earlier bots, and p50 is the usual median.
pub fn percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    match sorted_values {
        [] => 0.0,
        [only] => *only,
        _ => {
            let n = sorted_values.len();
            let rank = percentile * (n as f64 + 1.0) / 100.0;
            let j = (rank.floor() as usize).clamp(1, n - 1);
            let lower = sorted_values[j - 1];
            let upper = sorted_values[j];
            lower + (rank - j as f64) * (upper - lower)
        }
    }
}

/// Population standard deviation
fn standard_deviation(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}


// Additional property-based tests in separate module
#[cfg(test)]
mod comprehensive_tests;
