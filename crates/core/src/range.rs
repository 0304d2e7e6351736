//! Discretized parameter ranges
//!
//! A tunable bus quantity is never set to an arbitrary value. It moves over
//! `steps` evenly spaced positions between a minimum and a maximum, and the
//! concrete value of every position is derived from the step index by linear
//! interpolation (integer-truncated). All inputs are clamped, never rejected.

use crate::config::RangeSpec;

/// Bounded, steppable representation of one tunable quantity
///
/// # Invariants
///
/// - `current_step` is always in `0..steps`
/// - `current_value == step_to_value(current_step)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterRange {
    min: u32,
    max: u32,
    default: u32,
    steps: u8,
    current_step: u8,
    current_value: u32,
    optimal_step: u8,
}

impl ParameterRange {
    /// Create a range positioned on the step nearest below its default value
    ///
    /// `steps` must be at least 2; smaller values are raised to 2.
    pub fn new(spec: RangeSpec, steps: u8) -> Self {
        let mut range = Self {
            min: spec.min,
            max: spec.max,
            default: spec.default,
            steps: steps.max(2),
            current_step: 0,
            current_value: spec.min,
            optimal_step: 0,
        };
        let step = range.value_to_step(spec.default);
        range.current_step = step;
        range.current_value = range.step_to_value(step);
        range.optimal_step = step;
        range
    }

    /// Minimum value (step 0)
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Maximum value (last step)
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Configured default value
    pub fn default_value(&self) -> u32 {
        self.default
    }

    /// Number of discretization steps
    pub fn steps(&self) -> u8 {
        self.steps
    }

    /// Highest valid step index
    pub fn max_step(&self) -> u8 {
        self.steps - 1
    }

    /// Current step index
    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    /// Concrete value of the current step
    pub fn current_value(&self) -> u32 {
        self.current_value
    }

    /// Best-performing step seen so far
    pub fn optimal_step(&self) -> u8 {
        self.optimal_step
    }

    /// Distance between two adjacent steps
    pub fn step_size(&self) -> f32 {
        (self.max - self.min) as f32 / self.max_step() as f32
    }

    /// Check that a step index lies inside the range
    pub fn is_step_valid(&self, step: u8) -> bool {
        step < self.steps
    }

    /// Concrete value of a step, clamping the step to the last index
    pub fn step_to_value(&self, step: u8) -> u32 {
        let step = step.min(self.max_step()) as u64;
        let span = (self.max - self.min) as u64;
        self.min + (step * span / self.max_step() as u64) as u32
    }

    /// Step whose value is the nearest at or below `value` (value is clamped first)
    pub fn value_to_step(&self, value: u32) -> u8 {
        if value <= self.min {
            return 0;
        }
        if value >= self.max {
            return self.max_step();
        }
        let span = (self.max - self.min) as u64;
        let offset = (value - self.min) as u64;
        let mut step = (offset * self.max_step() as u64 / span) as u8;
        // Truncation in step_to_value can place the next step at or below value
        if step < self.max_step() && self.step_to_value(step + 1) <= value {
            step += 1;
        }
        step.min(self.max_step())
    }

    /// Step reached by moving `delta` steps from the current one, clamped to the range
    pub fn offset_step(&self, delta: i8) -> u8 {
        let target = self.current_step as i16 + delta as i16;
        target.clamp(0, self.max_step() as i16) as u8
    }

    /// Move to a new step, recomputing the current value
    ///
    /// Out-of-range steps are silently ignored.
    pub fn set_step(&mut self, step: u8) {
        if self.is_step_valid(step) {
            self.current_step = step;
            self.current_value = self.step_to_value(step);
        }
    }

    /// Remember the current step as the best-performing one
    pub fn mark_optimal(&mut self) {
        self.optimal_step = self.current_step;
    }
}
