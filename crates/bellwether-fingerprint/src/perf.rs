//! Latency metrics over successful samples.
//!
//! Percentiles use linear interpolation over the ascending sorted durations:
//! `p = (len - 1) × q / 100`, interpolated between the floor and ceil
//! indices. Confidence grades by sample count and coefficient of variation,
//! so a jittery or thin sample set cannot masquerade as a solid measurement.

use crate::sample::Sample;
use serde::{Deserialize, Serialize};

/// How much the latency numbers should be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerfConfidence {
    /// At least 20 samples with coefficient of variation ≤ 0.3.
    High,
    /// At least 10 samples with coefficient of variation ≤ 0.6.
    Medium,
    /// Enough samples to compute, too noisy or too few to trust.
    Low,
    /// Fewer than 3 successful samples; numbers are indicative only.
    #[serde(rename = "n/a")]
    NotApplicable,
}

/// Aggregated latency distribution of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: u64,
    pub max: u64,
    /// Successful calls over all calls, 0.0-1.0.
    pub success_rate: f64,
    /// Number of successful samples the distribution was computed from.
    pub sample_count: usize,
    pub confidence: PerfConfidence,
}

impl PerformanceMetrics {
    /// Computes metrics over a tool's samples. Durations come from
    /// successful calls only; the success rate counts everything.
    ///
    /// Returns `None` when there were no samples at all.
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut durations: Vec<u64> = samples
            .iter()
            .filter(|s| s.is_success())
            .map(|s| s.duration_ms)
            .collect();
        durations.sort_unstable();

        let success_rate = durations.len() as f64 / samples.len() as f64;

        if durations.is_empty() {
            return Some(Self {
                p50: 0.0,
                p95: 0.0,
                p99: 0.0,
                mean: 0.0,
                std_dev: 0.0,
                min: 0,
                max: 0,
                success_rate,
                sample_count: 0,
                confidence: PerfConfidence::NotApplicable,
            });
        }

        let mean = durations.iter().sum::<u64>() as f64 / durations.len() as f64;
        let variance = durations
            .iter()
            .map(|&d| {
                let diff = d as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / durations.len() as f64;
        let std_dev = variance.sqrt();

        Some(Self {
            p50: percentile(&durations, 50.0),
            p95: percentile(&durations, 95.0),
            p99: percentile(&durations, 99.0),
            mean,
            std_dev,
            min: durations[0],
            max: durations[durations.len() - 1],
            success_rate,
            sample_count: durations.len(),
            confidence: grade(durations.len(), mean, std_dev),
        })
    }
}

/// Linear-interpolated percentile over ascending sorted durations.
pub fn percentile(sorted: &[u64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }
    let rank = (sorted.len() - 1) as f64 * q / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo] as f64;
    }
    let weight = rank - lo as f64;
    sorted[lo] as f64 * (1.0 - weight) + sorted[hi] as f64 * weight
}

fn grade(count: usize, mean: f64, std_dev: f64) -> PerfConfidence {
    if count < 3 {
        return PerfConfidence::NotApplicable;
    }
    let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };
    if count >= 20 && cv <= 0.3 {
        PerfConfidence::High
    } else if count >= 10 && cv <= 0.6 {
        PerfConfidence::Medium
    } else {
        PerfConfidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn timed(ms: u64) -> Sample {
        Sample::success("t", json!({}), ms, json!("ok"))
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = vec![10, 20, 30, 40];
        // rank = 3 * 0.5 = 1.5 -> halfway between 20 and 30
        assert!((percentile(&sorted, 50.0) - 25.0).abs() < 1e-9);
        assert!((percentile(&sorted, 0.0) - 10.0).abs() < 1e-9);
        assert!((percentile(&sorted, 100.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn percentiles_are_ordered() {
        let samples: Vec<Sample> = [13, 7, 42, 5, 90, 31, 8, 22, 17, 60]
            .iter()
            .map(|&ms| timed(ms))
            .collect();
        let m = PerformanceMetrics::from_samples(&samples).unwrap();
        assert!(m.p50 <= m.p95);
        assert!(m.p95 <= m.p99);
        assert!(m.min as f64 <= m.p50);
        assert!(m.p99 <= m.max as f64);
    }

    #[test]
    fn single_sample_set() {
        let m = PerformanceMetrics::from_samples(&[timed(50)]).unwrap();
        assert_eq!(m.p50, 50.0);
        assert_eq!(m.p99, 50.0);
        assert_eq!(m.confidence, PerfConfidence::NotApplicable);
    }

    #[test]
    fn success_rate_counts_errors() {
        let samples = vec![
            timed(10),
            timed(20),
            Sample::error("t", json!({}), 5, "boom"),
            Sample::error("t", json!({}), 5, "boom"),
        ];
        let m = PerformanceMetrics::from_samples(&samples).unwrap();
        assert!((m.success_rate - 0.5).abs() < 1e-9);
        assert_eq!(m.sample_count, 2);
    }

    #[test]
    fn tight_large_sample_is_high_confidence() {
        let samples: Vec<Sample> = (0..25).map(|i| timed(100 + (i % 3))).collect();
        let m = PerformanceMetrics::from_samples(&samples).unwrap();
        assert_eq!(m.confidence, PerfConfidence::High);
    }

    #[test]
    fn noisy_sample_is_low_confidence() {
        let samples: Vec<Sample> = (0..25)
            .map(|i| timed(if i % 2 == 0 { 10 } else { 400 }))
            .collect();
        let m = PerformanceMetrics::from_samples(&samples).unwrap();
        assert_eq!(m.confidence, PerfConfidence::Low);
    }

    #[test]
    fn all_errors_yields_zero_distribution() {
        let samples = vec![Sample::error("t", json!({}), 5, "x")];
        let m = PerformanceMetrics::from_samples(&samples).unwrap();
        assert_eq!(m.sample_count, 0);
        assert_eq!(m.success_rate, 0.0);
        assert_eq!(m.confidence, PerfConfidence::NotApplicable);
    }

    #[test]
    fn no_samples_is_none() {
        assert!(PerformanceMetrics::from_samples(&[]).is_none());
    }
}
