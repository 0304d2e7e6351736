//! Bus fault classification
//!
//! Maps raw transport outcome codes to a small fault taxonomy and keeps a
//! fixed window of the most recent classifications for a recent-error-rate
//! estimate. The window is count-based, not time-based: a slot is only
//! overwritten when a new classification is recorded.

use core::fmt;

/// Transport outcome: transaction acknowledged
pub const OUTCOME_SUCCESS: u8 = 0;
/// Transport outcome: transmit buffer overflow / no response
pub const OUTCOME_DATA_TOO_LONG: u8 = 1;
/// Transport outcome: address not acknowledged
pub const OUTCOME_NACK_ADDRESS: u8 = 2;
/// Transport outcome: data byte not acknowledged
pub const OUTCOME_NACK_DATA: u8 = 3;
/// Transport outcome: any other bus error
pub const OUTCOME_OTHER: u8 = 4;

/// Number of classifications kept in the recent-fault window
pub const ERROR_WINDOW: usize = 10;

/// Fault taxonomy derived from transport outcome codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BusFault {
    /// No fault (or unrecognized outcome code)
    #[default]
    None = 0,
    /// Device did not answer in time
    Timeout = 1,
    /// Address byte not acknowledged
    NackAddress = 2,
    /// Data byte not acknowledged
    NackData = 3,
    /// Any other bus error
    Other = 4,
}

impl BusFault {
    /// Classify a transport outcome code
    ///
    /// Codes 1..=4 map one-to-one; anything else (including 0) is `None`.
    pub fn classify(code: u8) -> Self {
        match code {
            OUTCOME_DATA_TOO_LONG => BusFault::Timeout,
            OUTCOME_NACK_ADDRESS => BusFault::NackAddress,
            OUTCOME_NACK_DATA => BusFault::NackData,
            OUTCOME_OTHER => BusFault::Other,
            _ => BusFault::None,
        }
    }

    /// Check if this classification counts as a fault
    pub fn is_fault(&self) -> bool {
        *self != BusFault::None
    }

    /// Human-readable description
    pub fn as_str(&self) -> &'static str {
        match self {
            BusFault::None => "No error",
            BusFault::Timeout => "Timeout",
            BusFault::NackAddress => "NACK on address",
            BusFault::NackData => "NACK on data",
            BusFault::Other => "Other error",
        }
    }
}

impl fmt::Display for BusFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ring of the most recent fault classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultHistory {
    slots: [BusFault; ERROR_WINDOW],
    cursor: usize,
}

impl FaultHistory {
    /// Create a window filled with `None`
    pub const fn new() -> Self {
        Self {
            slots: [BusFault::None; ERROR_WINDOW],
            cursor: 0,
        }
    }

    /// Overwrite the oldest slot with a new classification
    pub fn record(&mut self, fault: BusFault) {
        self.slots[self.cursor] = fault;
        self.cursor = (self.cursor + 1) % ERROR_WINDOW;
    }

    /// Number of slots holding a real fault
    pub fn fault_count(&self) -> usize {
        self.slots.iter().filter(|f| f.is_fault()).count()
    }

    /// Percentage of slots holding a real fault (0-100)
    pub fn recent_error_rate(&self) -> f32 {
        self.fault_count() as f32 / ERROR_WINDOW as f32 * 100.0
    }

    /// Reset every slot to `None`
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for FaultHistory {
    fn default() -> Self {
        Self::new()
    }
}
