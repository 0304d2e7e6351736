//! Time abstraction for transaction timing and adjustment cooldowns.
//!
//! The controller needs two clocks: a microsecond clock to measure how long
//! each bus transaction took, and a millisecond clock to enforce the
//! cooldown between two applied timing adjustments. Both come from one
//! `TimeSource` so that host tests can drive them deterministically.

use core::cell::Cell;

/// Platform-agnostic time source for transaction timing.
///
/// Implementations:
/// - `EmbassyTime` (in the `smart_i2c` crate, feature `embassy`)
/// - `MockTime` for host testing with controllable time
///
/// # Example
///
/// ```
/// use smart_i2c_core::traits::{MockTime, TimeSource};
///
/// fn timed<T: TimeSource>(time: &T, op: impl FnOnce()) -> u64 {
///     let start = time.now_us();
///     op();
///     time.elapsed_since(start)
/// }
///
/// let time = MockTime::new();
/// assert_eq!(timed(&time, || time.advance(250)), 250);
/// ```
pub trait TimeSource: Clone + Send + Sync {
    /// Returns current time in milliseconds since system start.
    fn now_ms(&self) -> u64;

    /// Returns current time in microseconds since system start.
    fn now_us(&self) -> u64;

    /// Returns elapsed time in microseconds since a reference point.
    ///
    /// Uses saturating subtraction to handle potential overflow.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }

    /// Returns elapsed time in milliseconds since a reference point.
    fn elapsed_ms_since(&self, reference_ms: u64) -> u64 {
        self.now_ms().saturating_sub(reference_ms)
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock time source with manual advancement and an optional auto-tick.
///
/// With a non-zero tick, every `now_us()` read returns the current time and
/// then moves the clock forward by `tick_us`. A wrapped bus transaction reads
/// the clock once before and once after the raw call, so it measures exactly
/// one tick of elapsed time.
///
/// # Example
///
/// ```
/// use smart_i2c_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::with_tick(500);
/// let start = time.now_us();
/// assert_eq!(time.elapsed_since(start), 500);
///
/// time.advance(5_000_000);
/// assert!(time.now_ms() >= 5000);
/// ```
#[derive(Clone, Default)]
pub struct MockTime {
    current_us: Cell<u64>,
    tick_us: Cell<u64>,
}

// Safety: MockTime is only used in single-threaded test contexts
// where Cell is safe. The Send+Sync bounds on TimeSource trait
// are required for embedded contexts, but MockTime is not used there.
unsafe impl Send for MockTime {}
unsafe impl Sync for MockTime {}

impl MockTime {
    /// Creates a new `MockTime` starting at time 0 without auto-tick.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `MockTime` that advances by `tick_us` on every `now_us()` read.
    pub fn with_tick(tick_us: u64) -> Self {
        Self {
            current_us: Cell::new(0),
            tick_us: Cell::new(tick_us),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    /// Advances the current time by the specified amount.
    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }

    /// Advances the current time by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(ms * 1000);
    }

    /// Changes the auto-tick applied on each `now_us()` read.
    pub fn set_tick(&self, tick_us: u64) {
        self.tick_us.set(tick_us);
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_us.get() / 1000
    }

    fn now_us(&self) -> u64 {
        let now = self.current_us.get();
        self.current_us.set(now + self.tick_us.get());
        now
    }
}
