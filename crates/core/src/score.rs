//! Composite performance scoring
//!
//! Turns a metrics window plus the recent history into one 0-100 score:
//!
//! | Component   | Weight | Formula                                        |
//! |-------------|--------|------------------------------------------------|
//! | Reliability | 60 %   | `successful / total * 100`                     |
//! | Efficiency  | 25 %   | `100 / (1 + average_time_us / 1000)`           |
//! | Stability   | 15 %   | `100 - stddev(history scores)`, 50 when < 3    |
//!
//! A window without a single successful transaction scores 0 regardless of
//! its failures.

use crate::metrics::{MetricsHistory, PerformanceMetrics};
use libm::sqrtf;

/// Reliability weight in the composite score
pub const RELIABILITY_WEIGHT: f32 = 0.6;
/// Efficiency weight in the composite score
pub const EFFICIENCY_WEIGHT: f32 = 0.25;
/// Stability weight in the composite score
pub const STABILITY_WEIGHT: f32 = 0.15;

/// Transaction time that halves the efficiency score (us)
pub const EFFICIENCY_BASELINE_US: f32 = 1000.0;

/// Stability score used until enough history exists
pub const NEUTRAL_STABILITY: f32 = 50.0;

/// History samples required for stability and trend analysis
pub const MIN_HISTORY_SAMPLES: usize = 3;

/// Success percentage of the window
pub fn reliability(metrics: &PerformanceMetrics) -> f32 {
    let total = metrics.total();
    if total == 0 {
        return 0.0;
    }
    metrics.successful as f32 / total as f32 * 100.0
}

/// Speed of successful transactions, 0 when nothing was timed
pub fn efficiency(metrics: &PerformanceMetrics) -> f32 {
    if metrics.average_time_us == 0 {
        return 0.0;
    }
    let normalized = metrics.average_time_us as f32 / EFFICIENCY_BASELINE_US;
    (100.0 / (1.0 + normalized)).max(0.0)
}

/// Consistency of the recorded history scores
pub fn stability(history: &MetricsHistory) -> f32 {
    let samples = history.len();
    if samples < MIN_HISTORY_SAMPLES {
        return NEUTRAL_STABILITY;
    }
    let mean = history.scores().sum::<f32>() / samples as f32;
    let variance = history
        .scores()
        .map(|score| (score - mean) * (score - mean))
        .sum::<f32>()
        / samples as f32;
    (100.0 - sqrtf(variance)).max(0.0)
}

/// Weighted composite score in 0..=100
pub fn composite(metrics: &PerformanceMetrics, history: &MetricsHistory) -> f32 {
    if metrics.successful == 0 {
        return 0.0;
    }
    reliability(metrics) * RELIABILITY_WEIGHT
        + efficiency(metrics) * EFFICIENCY_WEIGHT
        + stability(history) * STABILITY_WEIGHT
}

/// Average change between successive history scores; positive means improving
pub fn trend(history: &MetricsHistory) -> f32 {
    let samples = history.len();
    if samples < MIN_HISTORY_SAMPLES {
        return 0.0;
    }
    let mut previous: Option<f32> = None;
    let mut total = 0.0;
    for score in history.scores() {
        if let Some(prev) = previous {
            total += score - prev;
        }
        previous = Some(score);
    }
    total / (samples - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::HistorySample;

    fn metrics(successful: u32, failed: u32, average_time_us: u32) -> PerformanceMetrics {
        let mut m = PerformanceMetrics {
            successful,
            failed,
            total_time_us: successful as u64 * average_time_us as u64,
            ..PerformanceMetrics::default()
        };
        m.refresh();
        m
    }

    fn history(scores: &[f32]) -> MetricsHistory {
        let mut h = MetricsHistory::new();
        for score in scores {
            h.push(HistorySample {
                metrics: PerformanceMetrics::default(),
                score: *score,
            });
        }
        h
    }

    #[test]
    fn test_zero_successes_scores_zero() {
        let h = MetricsHistory::new();
        assert_eq!(composite(&metrics(0, 0, 0), &h), 0.0);
        assert_eq!(composite(&metrics(0, 50, 0), &h), 0.0);
    }

    #[test]
    fn test_perfect_window_without_history() {
        // 100 * 0.6 + (100 / 1.5) * 0.25 + 50 * 0.15
        let score = composite(&metrics(25, 0, 500), &MetricsHistory::new());
        let expected = 60.0 + 100.0 / 1.5 * 0.25 + 7.5;
        assert!((score - expected).abs() < 1e-3);
    }

    #[test]
    fn test_failures_lower_reliability() {
        let h = MetricsHistory::new();
        let clean = composite(&metrics(10, 0, 500), &h);
        let noisy = composite(&metrics(10, 10, 500), &h);
        assert!(noisy < clean);
        assert!((reliability(&metrics(10, 10, 500)) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_efficiency_decreases_with_time() {
        assert!(efficiency(&metrics(1, 0, 100)) > efficiency(&metrics(1, 0, 2000)));
        assert!((efficiency(&metrics(1, 0, 1000)) - 50.0).abs() < 1e-3);
        assert_eq!(efficiency(&metrics(1, 0, 0)), 0.0);
    }

    #[test]
    fn test_stability_neutral_with_short_history() {
        assert_eq!(stability(&history(&[10.0, 90.0])), NEUTRAL_STABILITY);
    }

    #[test]
    fn test_stability_from_stddev() {
        assert!((stability(&history(&[80.0, 80.0, 80.0])) - 100.0).abs() < 1e-3);
        // stddev of [70, 80, 90] = sqrt(200 / 3)
        let expected = 100.0 - sqrtf(200.0 / 3.0);
        assert!((stability(&history(&[70.0, 80.0, 90.0])) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_trend() {
        assert_eq!(trend(&history(&[10.0, 20.0])), 0.0);
        assert!((trend(&history(&[10.0, 20.0, 40.0])) - 15.0).abs() < 1e-3);
        assert!(trend(&history(&[90.0, 80.0, 60.0])) < 0.0);
    }
}
