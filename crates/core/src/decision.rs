//! Adjustment decision engine
//!
//! Evaluated every `sample_size` transactions while learning is enabled. The
//! rules form an ordered chain and the first matching rule wins; the order
//! is behaviorally significant when several conditions hold at once.
//!
//! | # | Condition                                   | Clock | Rise | Conf. |
//! |---|---------------------------------------------|-------|------|-------|
//! | 1 | cooldown still running                      |   0   |  0   |   0   |
//! | 2 | recent error rate > 10 %                    |  -1   |  +1  |  85   |
//! | 3 | window error rate 0 % and > 20 successes    |       |      |       |
//! |   |   score > 1.15 x best: save current as best |       |      |       |
//! |   |   trend > 0.2 and rate > 6                  |  +1   |  -1  |  70   |
//! |   |   else trend > 0.1 and rate > 3             |  +1   |   0  |  60   |
//! | 4 | score < 0.7 x best: restore best            |   0   |  0   |  95   |
//! | 5 | consecutive errors >= 2                     |  -1   |  +1  |  80   |
//! | 6 | otherwise                                   |   0   |  0   |   0   |
//!
//! Rule 3 can save a new best snapshot and recommend a speed increase in
//! the same cycle. Rule 4 recommends no step change but asks the caller to
//! restore the best snapshot immediately.

use core::fmt;

/// Recent error rate above which speed is reduced (%)
pub const HIGH_ERROR_RATE: f32 = 10.0;
/// Successful transactions required before speeding up
pub const MIN_CLEAN_SUCCESSES: u32 = 20;
/// Score ratio over the best that makes the current window the new best
pub const NEW_BEST_RATIO: f32 = 1.15;
/// Score ratio under the best that triggers a restore
pub const RESTORE_RATIO: f32 = 0.7;
/// Trend and adaptation rate needed for an aggressive speed-up
pub const AGGRESSIVE_TREND: f32 = 0.2;
pub const AGGRESSIVE_RATE: u8 = 6;
/// Trend and adaptation rate needed for a moderate speed-up
pub const MODERATE_TREND: f32 = 0.1;
pub const MODERATE_RATE: u8 = 3;
/// Consecutive errors that make the engine slow down
pub const CONSECUTIVE_ERROR_LIMIT: u8 = 2;

/// Why a decision was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rationale {
    /// Previous adjustment too recent
    CooldownActive,
    /// Recent fault window above threshold
    HighErrorRate,
    /// Current window saved as the best configuration
    NewBestConfiguration,
    /// Positive trend with aggressive adaptation
    OptimizingSpeed,
    /// Positive trend with moderate adaptation
    ModerateOptimization,
    /// Performance dropped well below the best; best restored
    RestoringBest,
    /// Back-to-back failures
    ConsecutiveErrors,
    /// Nothing to do
    NoAdjustmentNeeded,
}

impl Rationale {
    /// Human-readable tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Rationale::CooldownActive => "Cooldown period active",
            Rationale::HighErrorRate => "High error rate detected",
            Rationale::NewBestConfiguration => "New best configuration found",
            Rationale::OptimizingSpeed => "Positive trend, optimizing speed",
            Rationale::ModerateOptimization => "Moderate optimization",
            Rationale::RestoringBest => "Restoring best configuration",
            Rationale::ConsecutiveErrors => "Consecutive errors, reducing speed",
            Rationale::NoAdjustmentNeeded => "No adjustment needed",
        }
    }
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State change the caller must perform immediately, independent of `should_apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Copy the live configuration into the best snapshot
    SaveCurrentAsBest,
    /// Replace the live configuration with the best snapshot
    RestoreBest,
}

/// Outcome of one decision cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Clock step delta (-1, 0, +1)
    pub clock_delta: i8,
    /// Rise-time step delta (-1, 0, +1)
    pub rise_delta: i8,
    /// Confidence (0-100)
    pub confidence: u8,
    /// Step deltas should be applied
    pub should_apply: bool,
    /// Why
    pub rationale: Rationale,
    /// Snapshot bookkeeping requested by the rule that fired
    pub side_effect: Option<SideEffect>,
}

impl Decision {
    /// Decision that changes nothing
    pub const fn hold(rationale: Rationale) -> Self {
        Self {
            clock_delta: 0,
            rise_delta: 0,
            confidence: 0,
            should_apply: false,
            rationale,
            side_effect: None,
        }
    }

    const fn adjust(clock_delta: i8, rise_delta: i8, confidence: u8, rationale: Rationale) -> Self {
        Self {
            clock_delta,
            rise_delta,
            confidence,
            should_apply: true,
            rationale,
            side_effect: None,
        }
    }
}

/// Everything the engine looks at in one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInputs {
    /// Current time (ms)
    pub now_ms: u64,
    /// Time of the last applied adjustment (ms), `None` if never adjusted
    pub last_adjustment_ms: Option<u64>,
    /// Cooldown between adjustments (ms)
    pub cooldown_ms: u32,
    /// Composite score of the live window
    pub current_score: f32,
    /// Composite score of the best snapshot
    pub best_score: f32,
    /// Score trend over the history
    pub trend: f32,
    /// Recent fault window rate (%)
    pub recent_error_rate: f32,
    /// Live window error rate (%)
    pub error_rate: u8,
    /// Live window successful transactions
    pub successful: u32,
    /// Back-to-back failures
    pub consecutive_errors: u8,
    /// Adaptation rate (1-10)
    pub adaptation_rate: u8,
}

impl DecisionInputs {
    /// Check if the cooldown since the last adjustment is still running
    pub fn cooldown_active(&self) -> bool {
        match self.last_adjustment_ms {
            Some(last) => self.now_ms.saturating_sub(last) < self.cooldown_ms as u64,
            None => false,
        }
    }
}

/// Run the ordered rule chain
pub fn decide(inputs: &DecisionInputs) -> Decision {
    if inputs.cooldown_active() {
        return Decision::hold(Rationale::CooldownActive);
    }

    if inputs.recent_error_rate > HIGH_ERROR_RATE {
        return Decision::adjust(-1, 1, 85, Rationale::HighErrorRate);
    }

    if inputs.error_rate == 0 && inputs.successful > MIN_CLEAN_SUCCESSES {
        let mut decision = Decision::hold(Rationale::NoAdjustmentNeeded);

        if inputs.current_score > inputs.best_score * NEW_BEST_RATIO {
            decision.side_effect = Some(SideEffect::SaveCurrentAsBest);
            decision.rationale = Rationale::NewBestConfiguration;
        }

        let side_effect = decision.side_effect;
        if inputs.trend > AGGRESSIVE_TREND && inputs.adaptation_rate > AGGRESSIVE_RATE {
            decision = Decision::adjust(1, -1, 70, Rationale::OptimizingSpeed);
        } else if inputs.trend > MODERATE_TREND && inputs.adaptation_rate > MODERATE_RATE {
            decision = Decision::adjust(1, 0, 60, Rationale::ModerateOptimization);
        }
        decision.side_effect = side_effect;
        return decision;
    }

    if inputs.current_score < inputs.best_score * RESTORE_RATIO {
        let mut decision = Decision::hold(Rationale::RestoringBest);
        decision.confidence = 95;
        decision.side_effect = Some(SideEffect::RestoreBest);
        return decision;
    }

    if inputs.consecutive_errors >= CONSECUTIVE_ERROR_LIMIT {
        return Decision::adjust(-1, 1, 80, Rationale::ConsecutiveErrors);
    }

    Decision::hold(Rationale::NoAdjustmentNeeded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> DecisionInputs {
        DecisionInputs {
            now_ms: 60_000,
            last_adjustment_ms: None,
            cooldown_ms: 5_000,
            current_score: 80.0,
            best_score: 80.0,
            trend: 0.0,
            recent_error_rate: 0.0,
            error_rate: 0,
            successful: 25,
            consecutive_errors: 0,
            adaptation_rate: 5,
        }
    }

    #[test]
    fn test_cooldown_wins_over_everything() {
        let mut i = inputs();
        i.last_adjustment_ms = Some(58_000);
        i.recent_error_rate = 50.0;
        let decision = decide(&i);
        assert_eq!(decision.rationale, Rationale::CooldownActive);
        assert!(!decision.should_apply);
        assert_eq!(decision.side_effect, None);
    }

    #[test]
    fn test_cooldown_elapsed() {
        let mut i = inputs();
        i.last_adjustment_ms = Some(55_000);
        assert!(!i.cooldown_active());
        i.last_adjustment_ms = Some(55_001);
        assert!(i.cooldown_active());
    }

    #[test]
    fn test_high_error_rate_beats_optimization() {
        let mut i = inputs();
        i.recent_error_rate = 15.0;
        i.trend = 5.0;
        i.adaptation_rate = 10;
        let decision = decide(&i);
        assert_eq!(decision.rationale, Rationale::HighErrorRate);
        assert_eq!((decision.clock_delta, decision.rise_delta), (-1, 1));
        assert_eq!(decision.confidence, 85);
        assert!(decision.should_apply);
    }

    #[test]
    fn test_error_rate_at_threshold_is_not_high() {
        let mut i = inputs();
        i.recent_error_rate = 10.0;
        assert_ne!(decide(&i).rationale, Rationale::HighErrorRate);
    }

    #[test]
    fn test_aggressive_speedup() {
        let mut i = inputs();
        i.trend = 0.5;
        i.adaptation_rate = 7;
        let decision = decide(&i);
        assert_eq!(decision.rationale, Rationale::OptimizingSpeed);
        assert_eq!((decision.clock_delta, decision.rise_delta), (1, -1));
        assert_eq!(decision.confidence, 70);
    }

    #[test]
    fn test_moderate_speedup() {
        let mut i = inputs();
        i.trend = 0.15;
        i.adaptation_rate = 7;
        let decision = decide(&i);
        assert_eq!(decision.rationale, Rationale::ModerateOptimization);
        assert_eq!((decision.clock_delta, decision.rise_delta), (1, 0));
        assert_eq!(decision.confidence, 60);

        // Strong trend but only moderate adaptation rate
        i.trend = 0.5;
        i.adaptation_rate = 4;
        assert_eq!(decide(&i).rationale, Rationale::ModerateOptimization);
    }

    #[test]
    fn test_new_best_and_speedup_in_same_cycle() {
        let mut i = inputs();
        i.current_score = 90.0;
        i.best_score = 50.0;
        i.trend = 0.5;
        i.adaptation_rate = 8;
        let decision = decide(&i);
        assert_eq!(decision.side_effect, Some(SideEffect::SaveCurrentAsBest));
        assert_eq!(decision.rationale, Rationale::OptimizingSpeed);
        assert!(decision.should_apply);
    }

    #[test]
    fn test_new_best_without_trend() {
        let mut i = inputs();
        i.best_score = 0.0;
        let decision = decide(&i);
        assert_eq!(decision.side_effect, Some(SideEffect::SaveCurrentAsBest));
        assert_eq!(decision.rationale, Rationale::NewBestConfiguration);
        assert!(!decision.should_apply);
    }

    #[test]
    fn test_clean_window_without_trend_holds() {
        let decision = decide(&inputs());
        assert_eq!(decision.rationale, Rationale::NoAdjustmentNeeded);
        assert!(!decision.should_apply);
        assert_eq!(decision.side_effect, None);
    }

    #[test]
    fn test_clean_window_shadows_restore() {
        // Rule 3 matched, so rule 4 is never evaluated even with a poor score
        let mut i = inputs();
        i.current_score = 10.0;
        i.best_score = 90.0;
        assert_eq!(decide(&i).side_effect, None);
    }

    #[test]
    fn test_restore_best() {
        let mut i = inputs();
        i.error_rate = 20;
        i.current_score = 40.0;
        i.best_score = 90.0;
        let decision = decide(&i);
        assert_eq!(decision.rationale, Rationale::RestoringBest);
        assert_eq!(decision.side_effect, Some(SideEffect::RestoreBest));
        assert_eq!(decision.confidence, 95);
        assert!(!decision.should_apply);
    }

    #[test]
    fn test_consecutive_errors() {
        let mut i = inputs();
        i.error_rate = 5;
        i.consecutive_errors = 2;
        let decision = decide(&i);
        assert_eq!(decision.rationale, Rationale::ConsecutiveErrors);
        assert_eq!((decision.clock_delta, decision.rise_delta), (-1, 1));
        assert_eq!(decision.confidence, 80);
    }

    #[test]
    fn test_too_few_successes_falls_through() {
        let mut i = inputs();
        i.successful = 20;
        i.trend = 1.0;
        i.adaptation_rate = 10;
        assert_eq!(decide(&i).rationale, Rationale::NoAdjustmentNeeded);
    }
}
