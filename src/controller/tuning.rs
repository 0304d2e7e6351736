//! Tuning loop: metrics bookkeeping, decision cycles and recovery

use smart_i2c_core::config::{ControlFlags, DEFAULT_ADAPTATION_RATE};
use smart_i2c_core::decision::{self, Decision, DecisionInputs, SideEffect};
use smart_i2c_core::fault::BusFault;
use smart_i2c_core::metrics::HistorySample;
use smart_i2c_core::recovery::{self, RecoveryAction, RecoveryMode};
use smart_i2c_core::score;
use smart_i2c_core::snapshot::TimingSnapshot;
use smart_i2c_core::traits::TimeSource;

use super::SmartI2c;
use crate::platform::BusTransport;
use crate::{log_debug, log_error, log_info, log_trace, log_warn};

impl<B: BusTransport, T: TimeSource> SmartI2c<B, T> {
    // ------------------------------------------------------------------
    // Public tuning controls
    // ------------------------------------------------------------------

    /// Run one decision cycle now, ignoring the cooldown
    ///
    /// Returns `None` without doing anything until at least one transaction
    /// has succeeded in the current window.
    pub fn force_optimization(&mut self) -> Option<Decision> {
        if self.current.metrics.successful == 0 {
            return None;
        }
        self.last_adjustment_ms = None;
        log_debug!("forced optimization");
        Some(self.run_decision_cycle())
    }

    /// Return every tunable to its power-on value
    ///
    /// Clock goes to its lowest step and rise time to the middle step, all
    /// mode flags are turned on and the result becomes the best-known
    /// configuration. Registered devices and the performance history are
    /// kept.
    pub fn reset_to_defaults(&mut self) {
        let now = self.time.now_ms();
        self.set_global_steps(0, self.config.steps / 2);
        self.current.metrics.reset(now);

        self.flags = ControlFlags::all();
        self.adaptation_rate = DEFAULT_ADAPTATION_RATE;
        self.cooldown_ms = self.config.cooldown_ms;
        self.last_adjustment_ms = None;
        self.consecutive_errors = 0;
        self.last_error = BusFault::None;
        self.last_error_ms = None;
        self.faults.clear();
        self.score = 0.0;
        self.trend = 0.0;
        self.last_decision = None;

        self.apply_configuration();
        self.save_current_as_best();
        log_info!(
            "reset to defaults: {} Hz, {} ns rise",
            self.current.clock_hz,
            self.current.rise_ns
        );
    }

    /// Forget everything learned while keeping the current timing
    pub fn reset_learning(&mut self) {
        self.history.clear();
        self.current.metrics.reset(self.time.now_ms());
        self.faults.clear();
        self.score = 0.0;
        self.trend = 0.0;
        self.consecutive_errors = 0;
        self.last_adjustment_ms = None;
        self.last_decision = None;
        log_debug!("learning state cleared");
    }

    // ------------------------------------------------------------------
    // Per-transaction bookkeeping
    // ------------------------------------------------------------------

    pub(super) fn update_metrics(&mut self, success: bool, elapsed_us: u32, address: u8) {
        let now = self.time.now_ms();
        self.current.metrics.record(success, elapsed_us, now);

        if success {
            self.consecutive_errors = 0;
        } else {
            self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        }

        if self.flags.contains(ControlFlags::ADAPTIVE) {
            match self.registry.find_or_add(address, &self.current) {
                Some(entry) => entry.config.metrics.record(success, elapsed_us, now),
                None => log_trace!("0x{:x} not tracked, registry full", address),
            }
        }

        self.score = score::composite(&self.current.metrics, &self.history);
    }

    /// Check if this transaction closes a sampling interval
    pub(super) fn adjustment_due(&self) -> bool {
        let total = self.current.metrics.total();
        total > 0 && total % self.config.sample_size == 0
    }

    pub(super) fn handle_error(&mut self, fault: BusFault) {
        self.last_error = fault;
        self.last_error_ms = Some(self.time.now_ms());
        self.faults.record(fault);
        log_debug!(
            "bus fault on 0x{:x}: {} ({} consecutive)",
            self.active_address,
            fault.as_str(),
            self.consecutive_errors
        );

        if self.consecutive_errors >= self.config.error_threshold {
            self.run_recovery();
        }
    }

    // ------------------------------------------------------------------
    // Decision cycle
    // ------------------------------------------------------------------

    pub(super) fn run_decision_cycle(&mut self) -> Decision {
        // A device override only lasts until the next cycle
        if let Some((clock_step, rise_step)) = self.global_steps.take() {
            self.set_steps(clock_step, rise_step);
            self.apply_configuration();
        }

        self.trend = score::trend(&self.history);
        self.optimize_ranges();

        let inputs = self.decision_inputs();
        let decision = decision::decide(&inputs);

        match decision.side_effect {
            Some(SideEffect::SaveCurrentAsBest) => self.save_current_as_best(),
            Some(SideEffect::RestoreBest) => self.restore_best_configuration(),
            None => {}
        }

        if decision.should_apply {
            self.apply_decision(&decision);
        } else {
            log_trace!("no adjustment: {}", decision.rationale.as_str());
        }

        self.last_decision = Some(decision);
        decision
    }

    fn decision_inputs(&self) -> DecisionInputs {
        DecisionInputs {
            now_ms: self.time.now_ms(),
            last_adjustment_ms: self.last_adjustment_ms,
            cooldown_ms: self.cooldown_ms,
            current_score: score::composite(&self.current.metrics, &self.history),
            best_score: score::composite(&self.best.metrics, &self.history),
            trend: self.trend,
            recent_error_rate: self.faults.recent_error_rate(),
            error_rate: self.current.metrics.error_rate,
            successful: self.current.metrics.successful,
            consecutive_errors: self.consecutive_errors,
            adaptation_rate: self.adaptation_rate,
        }
    }

    fn apply_decision(&mut self, decision: &Decision) {
        let clock_step = self.clock_range.offset_step(decision.clock_delta);
        let rise_step = self.rise_range.offset_step(decision.rise_delta);

        self.close_window();
        self.set_global_steps(clock_step, rise_step);
        self.apply_configuration();

        let now = self.time.now_ms();
        self.last_adjustment_ms = Some(now);
        self.current.metrics.reset(now);

        log_info!(
            "adjusted timing ({}, confidence {}): {} Hz, {} ns rise",
            decision.rationale.as_str(),
            decision.confidence,
            self.current.clock_hz,
            self.current.rise_ns
        );
    }

    /// Move the current window into the history ring
    fn close_window(&mut self) {
        let sample = HistorySample {
            metrics: self.current.metrics,
            score: score::composite(&self.current.metrics, &self.history),
        };
        self.history.push(sample);
    }

    /// Remember the current steps as optimal when they beat the best score
    fn optimize_ranges(&mut self) {
        let best_score = score::composite(&self.best.metrics, &self.history);
        if self.score > best_score {
            self.clock_range.mark_optimal();
            self.rise_range.mark_optimal();
        }
    }

    pub(super) fn save_current_as_best(&mut self) {
        self.best = self.current;
        log_info!(
            "saved best timing: {} Hz, {} ns rise",
            self.best.clock_hz,
            self.best.rise_ns
        );
    }

    fn restore_best_configuration(&mut self) {
        self.adopt(self.best);
        self.apply_configuration();
        log_info!(
            "restored best timing: {} Hz, {} ns rise",
            self.current.clock_hz,
            self.current.rise_ns
        );
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    fn run_recovery(&mut self) -> RecoveryAction {
        let mode = RecoveryMode::select(self.flags);
        let action = recovery::plan(
            mode,
            self.faults.recent_error_rate(),
            self.clock_range.current_step(),
            self.rise_range.current_step(),
            self.rise_range.max_step(),
            self.config.emergency_cooldown_ms,
        );

        self.set_global_steps(action.clock_step, action.rise_step);
        self.apply_configuration();
        self.consecutive_errors = 0;

        if action.disable_learning {
            self.flags.remove(ControlFlags::LEARNING);
        }
        if let Some(cooldown_ms) = action.cooldown_ms {
            self.cooldown_ms = cooldown_ms;
            self.last_adjustment_ms = Some(self.time.now_ms());
        }

        match action.mode {
            RecoveryMode::Emergency => log_error!(
                "emergency recovery: {} Hz, {} ns rise, learning disabled",
                self.current.clock_hz,
                self.current.rise_ns
            ),
            _ => log_warn!(
                "{} recovery: {} Hz, {} ns rise",
                action.mode.as_str(),
                self.current.clock_hz,
                self.current.rise_ns
            ),
        }
        action
    }

    // ------------------------------------------------------------------
    // Timing application
    // ------------------------------------------------------------------

    /// Push a device's pinned timing into the live configuration
    pub(super) fn apply_device_override(&mut self, address: u8) {
        let Some(timing) = self
            .registry
            .find(address)
            .and_then(|entry| entry.override_timing())
            .copied()
        else {
            return;
        };
        if timing.same_timing(&self.current) {
            return;
        }

        if self.global_steps.is_none() {
            self.global_steps = Some((self.current.clock_step, self.current.rise_step));
        }
        self.set_steps(timing.clock_step, timing.rise_step);
        self.apply_configuration();
        log_debug!(
            "override for 0x{:x}: {} Hz, {} ns rise",
            address,
            timing.clock_hz,
            timing.rise_ns
        );
    }

    /// Move both ranges and the live timing to the given steps
    pub(super) fn set_steps(&mut self, clock_step: u8, rise_step: u8) {
        self.clock_range.set_step(clock_step);
        self.rise_range.set_step(rise_step);
        self.current.set_timing(
            self.clock_range.current_step(),
            self.rise_range.current_step(),
            self.clock_range.current_value(),
            self.rise_range.current_value(),
        );
    }

    /// Change the global timing, dropping any pending override restore
    pub(super) fn set_global_steps(&mut self, clock_step: u8, rise_step: u8) {
        self.global_steps = None;
        self.set_steps(clock_step, rise_step);
    }

    /// Make `snapshot` (timing and metrics) the live configuration
    pub(super) fn adopt(&mut self, snapshot: TimingSnapshot) {
        self.set_global_steps(snapshot.clock_step, snapshot.rise_step);
        self.current = snapshot;
    }

    /// Program the live timing into the transport
    pub(super) fn apply_configuration(&mut self) {
        self.bus.set_clock(self.current.clock_hz);
        if !self.bus.set_rise_time(self.current.rise_ns) {
            log_trace!("rise-time control unsupported by transport");
        }
        log_debug!(
            "timing: {} Hz, {} ns rise",
            self.current.clock_hz,
            self.current.rise_ns
        );
    }
}
