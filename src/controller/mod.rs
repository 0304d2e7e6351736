//! Self-adjusting I2C controller
//!
//! [`SmartI2c`] wraps a [`BusTransport`] and exposes the same transaction
//! primitives. Every wrapped call is timed and its outcome recorded; from
//! those observations the controller periodically nudges the bus clock and
//! rise-time compensation, and falls back to safer timing when failures
//! pile up.
//!
//! # Transaction Flow
//!
//! ```text
//! begin_transmission / request_from
//!   └─ apply per-device override (adaptive mode)
//! end_transmission / request_from
//!   ├─ time the raw transport call
//!   ├─ record outcome (global + per-device metrics)
//!   ├─ failure ─▶ classify, record fault, recovery at threshold
//!   └─ success ─▶ decision cycle every `sample_size` transactions
//! ```
//!
//! The caller always gets the transport's own outcome code or byte count
//! back unchanged; tuning is a side effect.
//!
//! # Example
//!
//! Requires the `mock` feature outside of unit tests.
//!
//! ```ignore
//! use smart_i2c::platform::mock::MockBus;
//! use smart_i2c::tuning::traits::MockTime;
//! use smart_i2c::SmartI2c;
//!
//! let mut i2c = SmartI2c::with_defaults(MockBus::with_devices(&[0x48]), MockTime::with_tick(500));
//! i2c.start();
//!
//! i2c.begin_transmission(0x48);
//! i2c.write(0x00);
//! assert_eq!(i2c.end_transmission(true), 0);
//! assert_eq!(i2c.metrics().successful, 1);
//! ```

mod diagnostics;
mod scan;
mod tuning;


pub use diagnostics::{DeviceReport, Diagnostics};
pub use scan::{ScanReport, MAX_PROBE_FAILURES};

use smart_i2c_core::config::{clamp_adaptation_rate, ConfigError, ControlFlags, TunerConfig};
use smart_i2c_core::decision::Decision;
use smart_i2c_core::fault::{BusFault, FaultHistory, OUTCOME_SUCCESS};
use smart_i2c_core::metrics::{MetricsHistory, PerformanceMetrics};
use smart_i2c_core::range::ParameterRange;
use smart_i2c_core::registry::{DeviceEntry, DeviceRegistry, RegistryError};
use smart_i2c_core::score::{self, NEUTRAL_STABILITY};
use smart_i2c_core::snapshot::TimingSnapshot;
use smart_i2c_core::traits::TimeSource;

use crate::platform::BusTransport;
use crate::{log_debug, log_info, log_warn};

/// Self-adjusting I2C controller
///
/// # Type Parameters
///
/// * `B` - Bus transport performing the actual traffic
/// * `T` - Time source for transaction timing and cooldowns
pub struct SmartI2c<B, T> {
    bus: B,
    time: T,
    config: TunerConfig,

    clock_range: ParameterRange,
    rise_range: ParameterRange,

    /// Live timing and the metrics of the current window
    current: TimingSnapshot,
    /// Best-known timing and the metrics it was saved with
    best: TimingSnapshot,
    /// Global steps to return to after a per-device override
    global_steps: Option<(u8, u8)>,

    history: MetricsHistory,
    registry: DeviceRegistry,
    faults: FaultHistory,

    flags: ControlFlags,
    adaptation_rate: u8,
    cooldown_ms: u32,
    last_adjustment_ms: Option<u64>,
    consecutive_errors: u8,

    last_error: BusFault,
    last_error_ms: Option<u64>,
    active_address: u8,

    score: f32,
    trend: f32,
    last_decision: Option<Decision>,
}

impl<B: BusTransport, T: TimeSource> SmartI2c<B, T> {
    /// Create a controller with a validated configuration
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] from [`TunerConfig::validate`].
    pub fn new(bus: B, time: T, config: TunerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(bus, time, config))
    }

    /// Create a controller with the default tuning configuration
    pub fn with_defaults(bus: B, time: T) -> Self {
        Self::build(bus, time, TunerConfig::default())
    }

    fn build(bus: B, time: T, config: TunerConfig) -> Self {
        let clock_range = ParameterRange::new(config.clock, config.steps);
        let rise_range = ParameterRange::new(config.rise, config.steps);
        let mut current = TimingSnapshot::from_ranges(&clock_range, &rise_range);
        current.metrics = PerformanceMetrics::starting_at(time.now_ms());

        Self {
            bus,
            time,
            clock_range,
            rise_range,
            current,
            best: current,
            global_steps: None,
            history: MetricsHistory::new(),
            registry: DeviceRegistry::new(),
            faults: FaultHistory::new(),
            flags: config.flags,
            adaptation_rate: clamp_adaptation_rate(config.adaptation_rate),
            cooldown_ms: config.cooldown_ms,
            last_adjustment_ms: None,
            consecutive_errors: 0,
            last_error: BusFault::None,
            last_error_ms: None,
            active_address: 0,
            score: 0.0,
            trend: 0.0,
            last_decision: None,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Initialize the bus in controller role and program the current timing
    pub fn start(&mut self) {
        self.bus.begin();
        self.apply_configuration();
        self.current.metrics.last_update_ms = self.time.now_ms();
        log_info!(
            "smart i2c started: {} Hz, {} ns rise",
            self.current.clock_hz,
            self.current.rise_ns
        );
    }

    /// Initialize the bus in target role at `address`
    pub fn start_as_target(&mut self, address: u8) {
        self.bus.begin_as_target(address);
        self.apply_configuration();
        self.current.metrics.last_update_ms = self.time.now_ms();
        log_info!("smart i2c started as target 0x{:x}", address);
    }

    /// Shut the bus down
    pub fn stop(&mut self) {
        self.bus.end();
        log_debug!("smart i2c stopped");
    }

    /// Shut the bus down and hand the transport back
    pub fn release(mut self) -> B {
        self.bus.end();
        self.bus
    }

    /// Restart the transport and reprogram the current timing
    pub fn reset_hardware(&mut self) {
        self.bus.end();
        self.bus.begin();
        self.apply_configuration();
        log_warn!("bus hardware reset");
    }

    // ------------------------------------------------------------------
    // Wrapped transaction primitives
    // ------------------------------------------------------------------

    /// Start staging a write to `address`
    pub fn begin_transmission(&mut self, address: u8) {
        self.prepare_for(address);
        self.bus.begin_transmission(address);
    }

    /// Send the staged write, returning the transport's outcome code
    pub fn end_transmission(&mut self, send_stop: bool) -> u8 {
        let start = self.time.now_us();
        let code = self.bus.end_transmission(send_stop);
        let elapsed = self.time.elapsed_since(start);

        // Unknown non-zero codes count as failures but classify as `None`
        let fault = (code != OUTCOME_SUCCESS).then(|| BusFault::classify(code));
        self.complete_transaction(self.active_address, elapsed, fault);
        code
    }

    /// Read up to `count` bytes from `address`, returning the bytes received
    ///
    /// Receiving nothing is recorded as a timeout.
    pub fn request_from(&mut self, address: u8, count: u8, send_stop: bool) -> u8 {
        self.prepare_for(address);

        let start = self.time.now_us();
        let received = self.bus.request_from(address, count, send_stop);
        let elapsed = self.time.elapsed_since(start);

        let fault = (received == 0).then_some(BusFault::Timeout);
        self.complete_transaction(address, elapsed, fault);
        received
    }

    /// Stage one byte
    pub fn write(&mut self, byte: u8) -> usize {
        self.bus.write(byte)
    }

    /// Stage a slice
    pub fn write_all(&mut self, bytes: &[u8]) -> usize {
        self.bus.write_all(bytes)
    }

    /// Bytes received and not yet read
    pub fn available(&self) -> usize {
        self.bus.available()
    }

    /// Take the next received byte
    pub fn read(&mut self) -> Option<u8> {
        self.bus.read()
    }

    /// Look at the next received byte
    pub fn peek(&self) -> Option<u8> {
        self.bus.peek()
    }

    /// Wait for staged output to drain
    pub fn flush(&mut self) {
        self.bus.flush();
    }

    fn prepare_for(&mut self, address: u8) {
        self.active_address = address;
        if self.flags.contains(ControlFlags::ADAPTIVE) {
            self.apply_device_override(address);
        }
    }

    fn complete_transaction(&mut self, address: u8, elapsed_us: u64, fault: Option<BusFault>) {
        let elapsed_us = u32::try_from(elapsed_us).unwrap_or(u32::MAX);
        self.update_metrics(fault.is_none(), elapsed_us, address);

        match fault {
            Some(fault) => self.handle_error(fault),
            None => {
                if self.flags.contains(ControlFlags::LEARNING) && self.adjustment_due() {
                    self.run_decision_cycle();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Mode and parameter controls
    // ------------------------------------------------------------------

    /// Turn periodic learning on or off
    ///
    /// Turning it on restores the default cooldown period.
    pub fn enable_learning(&mut self, enable: bool) {
        self.flags.set(ControlFlags::LEARNING, enable);
        if enable {
            self.cooldown_ms = self.config.cooldown_ms;
        }
        log_debug!("learning {}", if enable { "enabled" } else { "disabled" });
    }

    /// Turn per-device tracking and adaptive recovery on or off
    pub fn enable_adaptive_mode(&mut self, enable: bool) {
        self.flags.set(ControlFlags::ADAPTIVE, enable);
    }

    /// Turn emergency recovery on or off
    pub fn enable_emergency_recovery(&mut self, enable: bool) {
        self.flags.set(ControlFlags::EMERGENCY_RECOVERY, enable);
    }

    /// Set how aggressively the controller optimizes (clamped to 1..=10)
    pub fn set_adaptation_rate(&mut self, rate: u8) {
        self.adaptation_rate = clamp_adaptation_rate(rate);
    }

    /// Set the minimum time between two applied adjustments
    pub fn set_cooldown_period(&mut self, ms: u32) {
        self.cooldown_ms = ms;
    }

    /// Set the bus clock to the nearest valid step for `hz`
    pub fn set_clock_speed(&mut self, hz: u32) {
        let step = self.clock_range.value_to_step(hz);
        self.set_global_steps(step, self.rise_range.current_step());
        self.apply_configuration();
    }

    /// Set rise-time compensation to the nearest valid step for `ns`
    pub fn set_rise_time(&mut self, ns: u32) {
        let step = self.rise_range.value_to_step(ns);
        self.set_global_steps(self.clock_range.current_step(), step);
        self.apply_configuration();
    }

    // ------------------------------------------------------------------
    // Device registry
    // ------------------------------------------------------------------

    /// Track `address` using the current global timing
    ///
    /// # Errors
    ///
    /// `RegistryError::Full` at capacity, `AlreadyPresent` for a known
    /// address, `InvalidAddress` above 0x7F.
    pub fn register_device(&mut self, address: u8) -> Result<(), RegistryError> {
        let result = self.registry.add(address, &self.current);
        match result {
            Ok(()) => log_debug!("registered device 0x{:x}", address),
            Err(RegistryError::Full) => log_warn!("device registry full, 0x{:x} dropped", address),
            Err(_) => {}
        }
        result
    }

    /// Pin `address` to its own clock and rise time
    ///
    /// Values are converted to the nearest valid steps. The override is
    /// applied before every transaction to that device while adaptive mode
    /// is on.
    ///
    /// # Errors
    ///
    /// `RegistryError::Full` when the device is unknown and the registry is
    /// at capacity, `InvalidAddress` above 0x7F.
    pub fn set_device_specific_config(
        &mut self,
        address: u8,
        clock_hz: u32,
        rise_ns: u32,
    ) -> Result<(), RegistryError> {
        let result = self.registry.set_override(
            address,
            clock_hz,
            rise_ns,
            &self.clock_range,
            &self.rise_range,
            &self.current,
        );
        if result.is_err() {
            log_warn!("cannot install timing override for 0x{:x}", address);
        }
        result
    }

    /// Forget `address`; returns `false` if it was not tracked
    pub fn remove_device_config(&mut self, address: u8) -> bool {
        self.registry.remove(address)
    }

    /// Registry entry for `address`
    pub fn find_device(&self, address: u8) -> Option<&DeviceEntry> {
        self.registry.find(address)
    }

    /// Tracked devices in registration order
    pub fn devices(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.registry.iter()
    }

    /// Number of tracked devices
    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    /// Metrics observed for `address` (empty if unknown)
    pub fn device_metrics(&self, address: u8) -> PerformanceMetrics {
        self.registry
            .find(address)
            .map(|entry| entry.config.metrics)
            .unwrap_or_default()
    }

    /// Composite score of a device's own metrics, neutral 50 if unknown
    pub fn device_score(&self, address: u8) -> f32 {
        match self.registry.find(address) {
            Some(entry) => score::composite(&entry.config.metrics, &self.history),
            None => NEUTRAL_STABILITY,
        }
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Current bus clock in Hz
    pub fn clock_speed(&self) -> u32 {
        self.current.clock_hz
    }

    /// Current rise-time compensation in ns
    pub fn rise_time(&self) -> u32 {
        self.current.rise_ns
    }

    /// Current clock step index
    pub fn clock_step(&self) -> u8 {
        self.current.clock_step
    }

    /// Current rise-time step index
    pub fn rise_step(&self) -> u8 {
        self.current.rise_step
    }

    /// Clock frequency range
    pub fn clock_range(&self) -> &ParameterRange {
        &self.clock_range
    }

    /// Rise-time range
    pub fn rise_range(&self) -> &ParameterRange {
        &self.rise_range
    }

    /// Live timing snapshot
    pub fn current_config(&self) -> &TimingSnapshot {
        &self.current
    }

    /// Best-known timing snapshot
    pub fn best_config(&self) -> &TimingSnapshot {
        &self.best
    }

    /// Metrics of the current window
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.current.metrics
    }

    /// Closed windows kept for trend and stability analysis
    pub fn history(&self) -> &MetricsHistory {
        &self.history
    }

    /// Score after the most recent transaction
    pub fn performance_score(&self) -> f32 {
        self.score
    }

    /// Score trend computed by the most recent decision cycle
    pub fn trend(&self) -> f32 {
        self.trend
    }

    /// Enabled mode switches
    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    /// Check if periodic learning is on
    pub fn is_learning_enabled(&self) -> bool {
        self.flags.contains(ControlFlags::LEARNING)
    }

    /// Current adaptation rate (1..=10)
    pub fn adaptation_rate(&self) -> u8 {
        self.adaptation_rate
    }

    /// Current cooldown period in ms
    pub fn cooldown_period(&self) -> u32 {
        self.cooldown_ms
    }

    /// Failures since the last success
    pub fn consecutive_errors(&self) -> u8 {
        self.consecutive_errors
    }

    /// Check if the consecutive-failure count is at the recovery threshold
    pub fn is_in_recovery_mode(&self) -> bool {
        self.consecutive_errors >= self.config.error_threshold
    }

    /// Most recent fault classification
    pub fn last_error(&self) -> BusFault {
        self.last_error
    }

    /// Description of the most recent fault
    pub fn last_error_str(&self) -> &'static str {
        self.last_error.as_str()
    }

    /// Timestamp (ms) of the most recent fault
    pub fn last_error_ms(&self) -> Option<u64> {
        self.last_error_ms
    }

    /// Percentage of faults in the recent-fault window
    pub fn recent_error_rate(&self) -> f32 {
        self.faults.recent_error_rate()
    }

    /// Outcome of the most recent decision cycle
    pub fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }

    /// Configuration the controller was built with
    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Time source
    pub fn time(&self) -> &T {
        &self.time
    }

    /// Underlying transport
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Underlying transport, mutably
    ///
    /// Traffic issued directly on the transport bypasses tuning.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}
