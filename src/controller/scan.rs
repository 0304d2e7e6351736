//! Bus scan and exhaustive timing search
//!
//! Probes go straight to the transport: they do not count towards the
//! tuning metrics or the recent-fault window.

use smart_i2c_core::fault::OUTCOME_SUCCESS;
use smart_i2c_core::registry::{RegistryError, MAX_ADDRESS};
use smart_i2c_core::score;
use smart_i2c_core::traits::TimeSource;

use super::SmartI2c;
use crate::platform::BusTransport;
use crate::{log_debug, log_info, log_warn};

/// Probe failures a candidate timing tolerates before it is abandoned
pub const MAX_PROBE_FAILURES: u8 = 2;

/// Result of [`SmartI2c::scan_and_optimize`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScanReport {
    /// Devices that acknowledged during the scan
    pub devices_found: u8,
    /// Winning clock step
    pub clock_step: u8,
    /// Winning rise-time step
    pub rise_step: u8,
    /// Score of the winning configuration (0 if nothing passed)
    pub best_score: f32,
    /// Candidate configurations that passed probing
    pub candidates_passed: u16,
}

impl<B: BusTransport, T: TimeSource> SmartI2c<B, T> {
    /// Probe every 7-bit address and register the ones that acknowledge
    ///
    /// Returns the number of acknowledging addresses, including any that
    /// could not be registered because the registry is full.
    pub fn scan_bus(&mut self) -> u8 {
        let mut found = 0u8;
        for address in 1..=MAX_ADDRESS {
            if self.probe(address) != OUTCOME_SUCCESS {
                continue;
            }
            found += 1;
            match self.registry.add(address, &self.current) {
                Ok(()) | Err(RegistryError::AlreadyPresent) => {}
                Err(_) => log_warn!("device registry full, 0x{:x} not tracked", address),
            }
            log_debug!("found device at 0x{:x}", address);
        }
        log_info!("bus scan: {} devices", found);
        found
    }

    /// Try a timing candidate against every registered device
    ///
    /// The candidate stays live when it passes; its window metrics hold the
    /// probe results. A candidate failing more than [`MAX_PROBE_FAILURES`]
    /// probes is abandoned and the previous configuration restored.
    /// Returns `false` for out-of-range steps without touching the bus.
    pub fn test_configuration(&mut self, clock_step: u8, rise_step: u8) -> bool {
        if !self.clock_range.is_step_valid(clock_step) || !self.rise_range.is_step_valid(rise_step)
        {
            return false;
        }

        let previous = self.current;
        self.set_global_steps(clock_step, rise_step);
        self.current.metrics.reset(self.time.now_ms());
        self.apply_configuration();

        let mut failures = 0u8;
        for address in self.registry.addresses() {
            let start = self.time.now_us();
            let code = self.probe(address);
            let elapsed = u32::try_from(self.time.elapsed_since(start)).unwrap_or(u32::MAX);
            let now = self.time.now_ms();

            if code == OUTCOME_SUCCESS {
                self.current.metrics.record(true, elapsed, now);
                continue;
            }
            self.current.metrics.record(false, 0, now);
            failures += 1;
            if failures > MAX_PROBE_FAILURES {
                self.adopt(previous);
                self.apply_configuration();
                return false;
            }
        }
        true
    }

    /// Scan the bus, then try every timing combination and keep the best
    ///
    /// Runs `S * S` candidate trials with one probe per registered device
    /// each. Meant for start-up or on-demand calibration, not for a polling
    /// loop. The winner becomes the live and the best-known configuration.
    pub fn scan_and_optimize(&mut self) -> ScanReport {
        let devices_found = self.scan_bus();
        let mut report = ScanReport {
            devices_found,
            clock_step: self.current.clock_step,
            rise_step: self.current.rise_step,
            ..ScanReport::default()
        };
        if devices_found == 0 {
            log_warn!("no devices found, timing search skipped");
            return report;
        }

        let starting = self.current;
        let mut winner = None;
        let mut best_score = 0.0;

        for clock_step in 0..self.clock_range.steps() {
            for rise_step in 0..self.rise_range.steps() {
                if !self.test_configuration(clock_step, rise_step) {
                    continue;
                }
                report.candidates_passed += 1;
                let candidate_score = score::composite(&self.current.metrics, &self.history);
                if winner.is_none() || candidate_score > best_score {
                    best_score = candidate_score;
                    winner = Some(self.current);
                }
            }
        }

        self.adopt(winner.unwrap_or(starting));
        self.apply_configuration();
        self.save_current_as_best();

        report.clock_step = self.current.clock_step;
        report.rise_step = self.current.rise_step;
        report.best_score = best_score;
        log_info!(
            "timing search: {} of {} candidates passed, best {} Hz, {} ns rise (score {})",
            report.candidates_passed,
            self.clock_range.steps() as u16 * self.rise_range.steps() as u16,
            self.current.clock_hz,
            self.current.rise_ns,
            best_score
        );
        report
    }

    /// Address-only write used for presence checks
    fn probe(&mut self, address: u8) -> u8 {
        self.bus.begin_transmission(address);
        self.bus.end_transmission(true)
    }
}
