//! Timing configuration snapshots
//!
//! A snapshot bundles one complete timing choice (both step indices and their
//! concrete values) with the metrics observed while it was live. The
//! controller keeps a "current" and a "best" snapshot, and every registered
//! device carries its own. Snapshots are always replaced as a whole.

use crate::metrics::PerformanceMetrics;
use crate::range::ParameterRange;

/// One complete timing configuration and its observed performance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSnapshot {
    /// Clock range step index
    pub clock_step: u8,
    /// Rise-time range step index
    pub rise_step: u8,
    /// Clock frequency derived from `clock_step` (Hz)
    pub clock_hz: u32,
    /// Rise-time compensation derived from `rise_step` (ns)
    pub rise_ns: u32,
    /// Metrics observed under this configuration
    pub metrics: PerformanceMetrics,
    /// Snapshot holds a usable configuration
    pub valid: bool,
}

impl TimingSnapshot {
    /// Snapshot of the ranges' current positions with empty metrics
    pub fn from_ranges(clock: &ParameterRange, rise: &ParameterRange) -> Self {
        Self {
            clock_step: clock.current_step(),
            rise_step: rise.current_step(),
            clock_hz: clock.current_value(),
            rise_ns: rise.current_value(),
            metrics: PerformanceMetrics::default(),
            valid: true,
        }
    }

    /// Snapshot for explicit step indices, values derived from the ranges
    pub fn at_steps(
        clock: &ParameterRange,
        rise: &ParameterRange,
        clock_step: u8,
        rise_step: u8,
    ) -> Self {
        Self {
            clock_step,
            rise_step,
            clock_hz: clock.step_to_value(clock_step),
            rise_ns: rise.step_to_value(rise_step),
            metrics: PerformanceMetrics::default(),
            valid: true,
        }
    }

    /// Replace the timing part, keeping the metrics
    pub fn set_timing(&mut self, clock_step: u8, rise_step: u8, clock_hz: u32, rise_ns: u32) {
        self.clock_step = clock_step;
        self.rise_step = rise_step;
        self.clock_hz = clock_hz;
        self.rise_ns = rise_ns;
    }

    /// Check if two snapshots program the same bus timing
    pub fn same_timing(&self, other: &TimingSnapshot) -> bool {
        self.clock_hz == other.clock_hz && self.rise_ns == other.rise_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RangeSpec;

    #[test]
    fn test_from_ranges() {
        let mut clock = ParameterRange::new(RangeSpec::CLOCK_HZ, 20);
        let rise = ParameterRange::new(RangeSpec::RISE_NS, 20);
        clock.set_step(3);

        let snapshot = TimingSnapshot::from_ranges(&clock, &rise);
        assert_eq!(snapshot.clock_step, 3);
        assert_eq!(snapshot.clock_hz, clock.step_to_value(3));
        assert_eq!(snapshot.rise_step, rise.current_step());
        assert!(snapshot.valid);
        assert_eq!(snapshot.metrics.total(), 0);
    }

    #[test]
    fn test_same_timing_ignores_metrics() {
        let clock = ParameterRange::new(RangeSpec::CLOCK_HZ, 20);
        let rise = ParameterRange::new(RangeSpec::RISE_NS, 20);
        let a = TimingSnapshot::at_steps(&clock, &rise, 2, 5);
        let mut b = a;
        b.metrics.record(true, 100, 0);
        assert!(a.same_timing(&b));

        let c = TimingSnapshot::at_steps(&clock, &rise, 2, 6);
        assert!(!a.same_timing(&c));
    }
}
