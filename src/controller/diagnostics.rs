//! Read-only status snapshots
//!
//! [`Diagnostics`] and [`DeviceReport`] implement `Display` so they can be
//! written to whatever console the host application has.

use core::fmt;

use smart_i2c_core::config::ControlFlags;
use smart_i2c_core::registry::DeviceEntry;
use smart_i2c_core::traits::TimeSource;

use super::SmartI2c;
use crate::platform::BusTransport;

/// Controller status at one point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub clock_hz: u32,
    pub rise_ns: u32,
    pub clock_step: u8,
    pub rise_step: u8,
    pub score: f32,
    pub trend: f32,
    pub successful: u32,
    pub failed: u32,
    pub error_rate: u8,
    pub average_time_us: u32,
    pub consecutive_errors: u8,
    pub flags: ControlFlags,
    pub in_recovery: bool,
    pub last_error: &'static str,
    pub adaptation_rate: u8,
    pub device_count: usize,
}

fn enabled(on: bool) -> &'static str {
    if on {
        "Enabled"
    } else {
        "Disabled"
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Smart I2C Diagnostics ===")?;
        writeln!(f, "Clock Speed: {} Hz (step {})", self.clock_hz, self.clock_step)?;
        writeln!(f, "Rise Time: {} ns (step {})", self.rise_ns, self.rise_step)?;
        writeln!(f, "Performance Score: {:.2}", self.score)?;
        writeln!(f, "Trend: {:.3}", self.trend)?;
        writeln!(f, "Successful Transactions: {}", self.successful)?;
        writeln!(f, "Failed Transactions: {}", self.failed)?;
        writeln!(f, "Error Rate: {}%", self.error_rate)?;
        writeln!(f, "Average Transaction Time: {} us", self.average_time_us)?;
        writeln!(f, "Consecutive Errors: {}", self.consecutive_errors)?;
        writeln!(
            f,
            "Learning Mode: {}",
            enabled(self.flags.contains(ControlFlags::LEARNING))
        )?;
        writeln!(
            f,
            "Adaptive Mode: {}",
            enabled(self.flags.contains(ControlFlags::ADAPTIVE))
        )?;
        writeln!(
            f,
            "Emergency Recovery: {}",
            enabled(self.flags.contains(ControlFlags::EMERGENCY_RECOVERY))
        )?;
        writeln!(
            f,
            "Recovery Mode: {}",
            if self.in_recovery { "Active" } else { "Inactive" }
        )?;
        writeln!(f, "Last Error: {}", self.last_error)?;
        writeln!(f, "Adaptation Rate: {}", self.adaptation_rate)?;
        write!(f, "Device Count: {}", self.device_count)
    }
}

/// Summary of one registered device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceReport {
    pub address: u8,
    /// Pinned `(clock_hz, rise_ns)`, `None` when the device follows the global timing
    pub timing_override: Option<(u32, u32)>,
    pub successful: u32,
    pub failed: u32,
}

impl From<&DeviceEntry> for DeviceReport {
    fn from(entry: &DeviceEntry) -> Self {
        Self {
            address: entry.address,
            timing_override: entry
                .override_timing()
                .map(|timing| (timing.clock_hz, timing.rise_ns)),
            successful: entry.config.metrics.successful,
            failed: entry.config.metrics.failed,
        }
    }
}

impl fmt::Display for DeviceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device 0x{:02X}: ", self.address)?;
        match self.timing_override {
            Some((clock_hz, rise_ns)) => write!(f, "{} Hz, {} ns", clock_hz, rise_ns)?,
            None => write!(f, "global timing")?,
        }
        write!(f, " | Success: {}, Fail: {}", self.successful, self.failed)
    }
}

impl<B: BusTransport, T: TimeSource> SmartI2c<B, T> {
    /// Snapshot of the controller status
    pub fn diagnostics(&self) -> Diagnostics {
        let metrics = &self.current.metrics;
        Diagnostics {
            clock_hz: self.current.clock_hz,
            rise_ns: self.current.rise_ns,
            clock_step: self.current.clock_step,
            rise_step: self.current.rise_step,
            score: self.score,
            trend: self.trend,
            successful: metrics.successful,
            failed: metrics.failed,
            error_rate: metrics.error_rate,
            average_time_us: metrics.average_time_us,
            consecutive_errors: self.consecutive_errors,
            flags: self.flags,
            in_recovery: self.is_in_recovery_mode(),
            last_error: self.last_error_str(),
            adaptation_rate: self.adaptation_rate,
            device_count: self.registry.len(),
        }
    }

    /// Per-device summaries in registration order
    pub fn device_reports(&self) -> impl Iterator<Item = DeviceReport> + '_ {
        self.registry.iter().map(DeviceReport::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_report_display() {
        let report = DeviceReport {
            address: 0x48,
            timing_override: Some((75_000, 250)),
            successful: 3,
            failed: 1,
        };
        assert_eq!(
            format!("{}", report),
            "Device 0x48: 75000 Hz, 250 ns | Success: 3, Fail: 1"
        );

        let report = DeviceReport {
            timing_override: None,
            ..report
        };
        assert_eq!(
            format!("{}", report),
            "Device 0x48: global timing | Success: 3, Fail: 1"
        );
    }
}
