//! Transaction performance metrics
//!
//! [`PerformanceMetrics`] aggregates the outcomes of a population of bus
//! transactions (the live window, the best-known snapshot, or one device).
//! [`MetricsHistory`] keeps the most recent closed windows together with the
//! score each one earned, for trend and stability analysis.

use heapless::Deque;

/// Number of closed metric windows retained for trend analysis
pub const LEARNING_WINDOW: usize = 10;

/// Counters and derived statistics for a population of transactions
///
/// # Invariants
///
/// - `error_rate == failed * 100 / (successful + failed)` when the total is non-zero
/// - `average_time_us == total_time_us / successful` when `successful > 0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceMetrics {
    /// Successful transactions
    pub successful: u32,
    /// Failed transactions
    pub failed: u32,
    /// Cumulative duration of successful transactions (us)
    pub total_time_us: u64,
    /// Mean duration of a successful transaction (us)
    pub average_time_us: u32,
    /// Failure percentage (0-100)
    pub error_rate: u8,
    /// Stability placeholder (not derived from the counters)
    pub stability: u8,
    /// Time of the last update (ms)
    pub last_update_ms: u64,
}

impl PerformanceMetrics {
    /// Create an empty metrics window stamped at `now_ms`
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            last_update_ms: now_ms,
            ..Self::default()
        }
    }

    /// Total recorded transactions
    pub fn total(&self) -> u32 {
        self.successful.saturating_add(self.failed)
    }

    /// Record one transaction outcome and refresh derived statistics
    pub fn record(&mut self, success: bool, elapsed_us: u32, now_ms: u64) {
        if success {
            self.successful = self.successful.saturating_add(1);
            self.total_time_us = self.total_time_us.saturating_add(elapsed_us as u64);
        } else {
            self.failed = self.failed.saturating_add(1);
        }
        self.refresh();
        self.last_update_ms = now_ms;
    }

    /// Recompute error rate and average time from the counters
    pub fn refresh(&mut self) {
        let total = self.total() as u64;
        if total > 0 {
            self.error_rate = (self.failed as u64 * 100 / total) as u8;
        }
        if self.successful > 0 {
            self.average_time_us = (self.total_time_us / self.successful as u64) as u32;
        }
    }

    /// Clear all counters, starting a fresh window at `now_ms`
    pub fn reset(&mut self, now_ms: u64) {
        *self = Self::starting_at(now_ms);
    }
}

/// One closed metrics window and the score it earned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySample {
    /// Metrics of the window when it was closed
    pub metrics: PerformanceMetrics,
    /// Composite score at closing time (0-100)
    pub score: f32,
}

/// Fixed-capacity ring of recent windows; the newest evicts the oldest
#[derive(Debug, Clone, Default)]
pub struct MetricsHistory {
    samples: Deque<HistorySample, LEARNING_WINDOW>,
}

impl MetricsHistory {
    /// Create an empty history
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Append a closed window, evicting the oldest when full
    pub fn push(&mut self, sample: HistorySample) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        let _ = self.samples.push_back(sample);
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if no samples are retained
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    /// Scores from oldest to newest
    pub fn scores(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().map(|s| s.score)
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    /// Drop every sample
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
