//! Property-based tests for latency aggregation
//!
//! These check the ordering and range guarantees of the aggregator over
//! arbitrary sample sets rather than hand-picked distributions.

use super::{aggregate, percentile, LatencyAggregator};
use proptest::collection::vec;
use proptest::prelude::*;

/// Property-based test generators
mod generators {
    use super::*;

    /// Latencies between 1µs and 10s
    pub fn latencies() -> impl Strategy<Value = Vec<u64>> {
        vec(1u64..10_000_000, 1..500)
    }
}

proptest! {
    /// Mean and median always lie between the smallest and largest sample
    #[test]
    fn statistics_within_sample_range(samples in generators::latencies()) {
        let result = aggregate(&samples).unwrap();
        let min = *samples.iter().min().unwrap() as f64;
        let max = *samples.iter().max().unwrap() as f64;

        prop_assert!(result.mean_us >= min - 1e-6 && result.mean_us <= max + 1e-6);
        prop_assert!(result.median_us >= min && result.median_us <= max);
        prop_assert_eq!(result.min_us, min);
        prop_assert_eq!(result.max_us, max);
    }

    /// From 99 samples on, p99 needs no extrapolation
    #[test]
    fn p99_within_range_for_large_runs(samples in vec(1u64..10_000_000, 99..500)) {
        let result = aggregate(&samples).unwrap();
        prop_assert!(result.p99_us >= result.min_us - 1e-6);
        prop_assert!(result.p99_us <= result.max_us + 1e-6);
    }

    /// The 99th percentile never falls below the median
    #[test]
    fn p99_not_below_median(samples in generators::latencies()) {
        let result = aggregate(&samples).unwrap();
        prop_assert!(result.p99_us >= result.median_us - 1e-6);
    }

    /// Sample count matches the input, duplicates included
    #[test]
    fn sample_count_matches(samples in generators::latencies()) {
        let result = aggregate(&samples).unwrap();
        prop_assert_eq!(result.sample_count, samples.len());
    }

    /// Percentiles are monotone in p
    #[test]
    fn percentile_monotone(samples in generators::latencies(), a in 0.0f64..100.0, b in 0.0f64..100.0) {
        let mut sorted: Vec<f64> = samples.iter().map(|&v| v as f64).collect();
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(percentile(&sorted, low) <= percentile(&sorted, high) + 1e-6);
    }

    /// A constant series aggregates to that constant
    #[test]
    fn constant_series(value in 0u64..1_000_000, n in 1usize..200) {
        let samples = vec![value; n];
        let result = aggregate(&samples).unwrap();
        let expected = value as f64;
        prop_assert!((result.mean_us - expected).abs() < 1e-6);
        prop_assert!((result.median_us - expected).abs() < 1e-6);
        prop_assert!((result.p99_us - expected).abs() < 1e-6);
        prop_assert!(result.std_dev_us.abs() < 1e-6);
    }

    /// The percentile table agrees with the aggregate for p50 and p99
    #[test]
    fn table_agrees_with_aggregate(samples in generators::latencies()) {
        let aggregator = LatencyAggregator::with_defaults();
        let result = aggregator.aggregate(&samples).unwrap();
        let table = aggregator.percentile_table(&samples);

        let p50 = table.iter().find(|(p, _)| *p == 50.0).map(|(_, v)| *v).unwrap();
        let p99 = table.iter().find(|(p, _)| *p == 99.0).map(|(_, v)| *v).unwrap();
        prop_assert_eq!(p50, result.median_us);
        prop_assert_eq!(p99, result.p99_us);
    }
}

#[test]
fn large_latencies_do_not_overflow() {
    let samples = vec![u64::MAX / 2, u64::MAX / 2, u64::MAX / 2];
    let result = aggregate(&samples).unwrap();
    assert!(result.mean_us.is_finite());
    assert!(result.p99_us.is_finite());
}
