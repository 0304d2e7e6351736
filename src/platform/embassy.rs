//! Embassy time source
//!
//! Backs the controller's [`TimeSource`] with the `embassy-time` driver.

use smart_i2c_core::traits::TimeSource;

/// Time source reading the Embassy monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTime;

impl TimeSource for EmbassyTime {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }

    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }
}
