//! Mock platform implementation for testing
//!
//! This module provides a scripted bus transport that can be used for unit
//! testing the controller without actual hardware.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! Requires the `mock` feature outside of unit tests.
//!
//! ```ignore
//! use smart_i2c::platform::mock::MockBus;
//! use smart_i2c::platform::BusTransport;
//!
//! let mut bus = MockBus::with_devices(&[0x48]);
//! bus.begin_transmission(0x48);
//! assert_eq!(bus.end_transmission(true), 0);
//! bus.begin_transmission(0x49);
//! assert_eq!(bus.end_transmission(true), 2);
//! ```

#![cfg(any(test, feature = "mock"))]

mod bus;

pub use bus::{BusCall, MockBus};
