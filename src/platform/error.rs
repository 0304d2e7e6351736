//! Platform error types
//!
//! Transports map their HAL-specific errors to [`TransportError`]. The
//! controller itself works with the byte-sized outcome codes the bus
//! primitives return, so every variant also maps to one of those.

use core::fmt;

use smart_i2c_core::fault::{
    OUTCOME_DATA_TOO_LONG, OUTCOME_NACK_ADDRESS, OUTCOME_NACK_DATA, OUTCOME_OTHER,
};

/// Which phase of a transfer was not acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NackSource {
    /// Target did not acknowledge its address
    Address,
    /// Target did not acknowledge a data byte
    Data,
    /// Driver could not tell which phase failed
    Unknown,
}

/// Transport-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No acknowledgment received
    Nack(NackSource),
    /// Arbitration lost to another controller
    ArbitrationLoss,
    /// Misplaced START/STOP or other bus error
    Bus,
    /// Receive overrun or transmit underrun
    Overrun,
    /// Clock stretching or completion wait timed out
    Timeout,
    /// Transmit buffer exhausted before the transaction was sent
    BufferFull,
    /// Any other driver failure
    Other,
}

impl TransportError {
    /// Outcome code reported by `end_transmission` for this error
    ///
    /// `1` no response (buffer, overrun or timeout), `2` address NACK,
    /// `3` data NACK, `4` other.
    /// A NACK whose phase is unknown counts as an address NACK, the common
    /// case when probing absent devices.
    pub fn outcome_code(&self) -> u8 {
        match self {
            TransportError::Nack(NackSource::Address | NackSource::Unknown) => {
                OUTCOME_NACK_ADDRESS
            }
            TransportError::Nack(NackSource::Data) => OUTCOME_NACK_DATA,
            TransportError::BufferFull | TransportError::Overrun | TransportError::Timeout => {
                OUTCOME_DATA_TOO_LONG
            }
            TransportError::ArbitrationLoss | TransportError::Bus | TransportError::Other => {
                OUTCOME_OTHER
            }
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Nack(NackSource::Address) => write!(f, "NACK on address"),
            TransportError::Nack(NackSource::Data) => write!(f, "NACK on data"),
            TransportError::Nack(NackSource::Unknown) => write!(f, "NACK"),
            TransportError::ArbitrationLoss => write!(f, "Arbitration lost"),
            TransportError::Bus => write!(f, "Bus error"),
            TransportError::Overrun => write!(f, "Overrun"),
            TransportError::Timeout => write!(f, "Timeout"),
            TransportError::BufferFull => write!(f, "Transmit buffer full"),
            TransportError::Other => write!(f, "Other error"),
        }
    }
}
