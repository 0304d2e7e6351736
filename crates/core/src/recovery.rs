//! Recovery reflexes
//!
//! When the consecutive-failure count reaches the configured threshold the
//! controller takes exactly one corrective action, chosen by the enabled
//! recovery modes in priority order (emergency, then adaptive, then
//! incremental). This is a reflex, not a multi-step machine: no state is
//! kept between invocations beyond the controller's own counters and flags.

use crate::config::ControlFlags;

/// Recent error rate above which adaptive recovery escalates to emergency (%)
pub const ESCALATION_ERROR_RATE: f32 = 20.0;

/// Recovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// One clock step slower
    Incremental,
    /// One clock step slower and one rise step longer, or emergency on heavy faults
    Adaptive,
    /// Slowest clock, longest rise time, learning off, long cooldown
    Emergency,
}

impl RecoveryMode {
    /// Pick the strategy from the enabled mode flags
    pub fn select(flags: ControlFlags) -> Self {
        if flags.contains(ControlFlags::EMERGENCY_RECOVERY) {
            RecoveryMode::Emergency
        } else if flags.contains(ControlFlags::ADAPTIVE) {
            RecoveryMode::Adaptive
        } else {
            RecoveryMode::Incremental
        }
    }

    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryMode::Incremental => "incremental",
            RecoveryMode::Adaptive => "adaptive",
            RecoveryMode::Emergency => "emergency",
        }
    }
}

/// Corrective action computed for one threshold crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryAction {
    /// Strategy actually carried out (after escalation)
    pub mode: RecoveryMode,
    /// New clock step
    pub clock_step: u8,
    /// New rise-time step
    pub rise_step: u8,
    /// Learning must be switched off
    pub disable_learning: bool,
    /// Cooldown to install, restarting it from now
    pub cooldown_ms: Option<u32>,
}

/// Compute the corrective action for the selected strategy
///
/// `max_step` is the highest valid step index of both ranges.
pub fn plan(
    mode: RecoveryMode,
    recent_error_rate: f32,
    clock_step: u8,
    rise_step: u8,
    max_step: u8,
    emergency_cooldown_ms: u32,
) -> RecoveryAction {
    match mode {
        RecoveryMode::Emergency => RecoveryAction {
            mode: RecoveryMode::Emergency,
            clock_step: 0,
            rise_step: max_step,
            disable_learning: true,
            cooldown_ms: Some(emergency_cooldown_ms),
        },
        RecoveryMode::Adaptive if recent_error_rate > ESCALATION_ERROR_RATE => plan(
            RecoveryMode::Emergency,
            recent_error_rate,
            clock_step,
            rise_step,
            max_step,
            emergency_cooldown_ms,
        ),
        RecoveryMode::Adaptive => RecoveryAction {
            mode: RecoveryMode::Adaptive,
            clock_step: clock_step.saturating_sub(1),
            rise_step: rise_step.saturating_add(1).min(max_step),
            disable_learning: false,
            cooldown_ms: None,
        },
        RecoveryMode::Incremental => RecoveryAction {
            mode: RecoveryMode::Incremental,
            clock_step: clock_step.saturating_sub(1),
            rise_step,
            disable_learning: false,
            cooldown_ms: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_priority() {
        assert_eq!(RecoveryMode::select(ControlFlags::all()), RecoveryMode::Emergency);
        assert_eq!(
            RecoveryMode::select(ControlFlags::ADAPTIVE | ControlFlags::LEARNING),
            RecoveryMode::Adaptive
        );
        assert_eq!(
            RecoveryMode::select(ControlFlags::LEARNING),
            RecoveryMode::Incremental
        );
        assert_eq!(
            RecoveryMode::select(ControlFlags::empty()),
            RecoveryMode::Incremental
        );
    }

    #[test]
    fn test_emergency() {
        let action = plan(RecoveryMode::Emergency, 0.0, 12, 3, 19, 15_000);
        assert_eq!(action.clock_step, 0);
        assert_eq!(action.rise_step, 19);
        assert!(action.disable_learning);
        assert_eq!(action.cooldown_ms, Some(15_000));
    }

    #[test]
    fn test_adaptive_steps() {
        let action = plan(RecoveryMode::Adaptive, 20.0, 5, 8, 19, 15_000);
        assert_eq!(action.mode, RecoveryMode::Adaptive);
        assert_eq!((action.clock_step, action.rise_step), (4, 9));
        assert!(!action.disable_learning);
        assert_eq!(action.cooldown_ms, None);
    }

    #[test]
    fn test_adaptive_saturates() {
        let action = plan(RecoveryMode::Adaptive, 0.0, 0, 19, 19, 15_000);
        assert_eq!((action.clock_step, action.rise_step), (0, 19));
    }

    #[test]
    fn test_adaptive_escalates() {
        let action = plan(RecoveryMode::Adaptive, 30.0, 5, 8, 19, 15_000);
        assert_eq!(action.mode, RecoveryMode::Emergency);
        assert_eq!((action.clock_step, action.rise_step), (0, 19));
        assert!(action.disable_learning);
    }

    #[test]
    fn test_incremental_only_touches_clock() {
        let action = plan(RecoveryMode::Incremental, 90.0, 5, 8, 19, 15_000);
        assert_eq!((action.clock_step, action.rise_step), (4, 8));

        let floor = plan(RecoveryMode::Incremental, 0.0, 0, 8, 19, 15_000);
        assert_eq!(floor.clock_step, 0);
    }
}
