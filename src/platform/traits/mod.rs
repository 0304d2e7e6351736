//! Platform abstraction traits
//!
//! This module defines the traits that bus transports must provide.

pub mod bus;

// Re-export trait interfaces
pub use bus::BusTransport;
