//! Tuner configuration
//!
//! Static configuration of the self-adjusting controller: the two tunable
//! ranges, the discretization step count, decision/recovery thresholds and
//! the initial mode flags. Defaults reproduce the reference tuning of the
//! controller (75 kHz .. 3.5 MHz clock, 40 .. 250 ns rise time, 20 steps).

use bitflags::bitflags;
use core::fmt;

/// Default discretization steps per range
pub const DEFAULT_STEPS: u8 = 20;

/// Default number of transactions between two decision cycles
pub const DEFAULT_SAMPLE_SIZE: u32 = 5;

/// Default consecutive-failure count that triggers a recovery reflex
pub const DEFAULT_ERROR_THRESHOLD: u8 = 3;

/// Default minimum time between two applied adjustments (ms)
pub const DEFAULT_COOLDOWN_MS: u32 = 5_000;

/// Cooldown installed by emergency recovery (ms)
pub const EMERGENCY_COOLDOWN_MS: u32 = 15_000;

/// Default adaptation rate (1 = conservative, 10 = aggressive)
pub const DEFAULT_ADAPTATION_RATE: u8 = 5;

/// Adaptation rate bounds
pub const MIN_ADAPTATION_RATE: u8 = 1;
pub const MAX_ADAPTATION_RATE: u8 = 10;

bitflags! {
    /// Controller mode switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlFlags: u8 {
        /// Periodic decision cycles are allowed to retune the bus
        const LEARNING = 0b0000_0001;
        /// Per-device metrics and overrides are tracked
        const ADAPTIVE = 0b0000_0010;
        /// Recovery escalates straight to the most conservative timing
        const EMERGENCY_RECOVERY = 0b0000_0100;
    }
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Bounds and default for one tunable quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    /// Minimum value (step 0)
    pub min: u32,
    /// Maximum value (last step)
    pub max: u32,
    /// Value the range starts from
    pub default: u32,
}

impl RangeSpec {
    /// Create a range specification
    pub const fn new(min: u32, max: u32, default: u32) -> Self {
        Self { min, max, default }
    }

    /// Clock frequency range in Hz
    pub const CLOCK_HZ: Self = Self::new(75_000, 3_500_000, 100_000);

    /// Rise-time compensation range in ns
    pub const RISE_NS: Self = Self::new(40, 250, 125);

    fn is_valid(&self) -> bool {
        self.min < self.max && self.default >= self.min && self.default <= self.max
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunerConfig {
    /// Clock frequency range (Hz)
    pub clock: RangeSpec,
    /// Rise-time compensation range (ns)
    pub rise: RangeSpec,
    /// Number of discretization steps per range (2..=255)
    pub steps: u8,
    /// Decision cycle period in transactions
    pub sample_size: u32,
    /// Consecutive failures that trigger recovery
    pub error_threshold: u8,
    /// Normal cooldown between adjustments (ms)
    pub cooldown_ms: u32,
    /// Cooldown installed by emergency recovery (ms)
    pub emergency_cooldown_ms: u32,
    /// Initial adaptation rate (clamped to 1..=10)
    pub adaptation_rate: u8,
    /// Initial mode flags
    pub flags: ControlFlags,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            clock: RangeSpec::CLOCK_HZ,
            rise: RangeSpec::RISE_NS,
            steps: DEFAULT_STEPS,
            sample_size: DEFAULT_SAMPLE_SIZE,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            emergency_cooldown_ms: EMERGENCY_COOLDOWN_MS,
            adaptation_rate: DEFAULT_ADAPTATION_RATE,
            flags: ControlFlags::default(),
        }
    }
}

impl TunerConfig {
    /// Check every field for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.clock.is_valid() || !self.rise.is_valid() {
            return Err(ConfigError::InvalidRange);
        }
        if self.steps < 2 {
            return Err(ConfigError::InvalidSteps);
        }
        if self.sample_size == 0 {
            return Err(ConfigError::InvalidSampleSize);
        }
        if self.error_threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        Ok(())
    }
}

/// Clamp an adaptation rate into 1..=10
pub fn clamp_adaptation_rate(rate: u8) -> u8 {
    rate.clamp(MIN_ADAPTATION_RATE, MAX_ADAPTATION_RATE)
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Range minimum not below maximum, or default outside the range
    InvalidRange,
    /// Fewer than two discretization steps
    InvalidSteps,
    /// Decision cycle period of zero transactions
    InvalidSampleSize,
    /// Recovery threshold of zero failures
    InvalidThreshold,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidRange => write!(f, "invalid parameter range"),
            ConfigError::InvalidSteps => write!(f, "at least two range steps are required"),
            ConfigError::InvalidSampleSize => write!(f, "sample size must be non-zero"),
            ConfigError::InvalidThreshold => write!(f, "error threshold must be non-zero"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TunerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.steps, 20);
        assert_eq!(config.cooldown_ms, 5_000);
        assert!(config.flags.contains(ControlFlags::LEARNING));
        assert!(config.flags.contains(ControlFlags::ADAPTIVE));
        assert!(config.flags.contains(ControlFlags::EMERGENCY_RECOVERY));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = TunerConfig {
            clock: RangeSpec::new(400_000, 100_000, 100_000),
            ..TunerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRange));
    }

    #[test]
    fn test_default_outside_range_rejected() {
        let config = TunerConfig {
            rise: RangeSpec::new(40, 250, 300),
            ..TunerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRange));
    }

    #[test]
    fn test_degenerate_values_rejected() {
        let steps = TunerConfig {
            steps: 1,
            ..TunerConfig::default()
        };
        assert_eq!(steps.validate(), Err(ConfigError::InvalidSteps));

        let sample = TunerConfig {
            sample_size: 0,
            ..TunerConfig::default()
        };
        assert_eq!(sample.validate(), Err(ConfigError::InvalidSampleSize));

        let threshold = TunerConfig {
            error_threshold: 0,
            ..TunerConfig::default()
        };
        assert_eq!(threshold.validate(), Err(ConfigError::InvalidThreshold));
    }

    #[test]
    fn test_adaptation_rate_clamped() {
        assert_eq!(clamp_adaptation_rate(0), 1);
        assert_eq!(clamp_adaptation_rate(7), 7);
        assert_eq!(clamp_adaptation_rate(42), 10);
    }
}
