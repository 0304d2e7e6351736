#![cfg_attr(not(test), no_std)]

//! smart_i2c - Self-adjusting I2C bus controller
//!
//! This library wraps an I2C bus transport and tunes its timing (clock
//! frequency, rise-time compensation) from observed transaction outcomes,
//! recovering automatically when communication degrades.
//!
//! The algorithms live in the `smart_i2c_core` crate (re-exported as
//! [`tuning`]); this crate adds the platform transports, logging and the
//! [`SmartI2c`] controller that ties them together.

// Mock transports use std collections
#[cfg(all(feature = "mock", not(test)))]
extern crate std;

// Platform abstraction layer (bus transports, time drivers)
pub mod platform;

// Logging infrastructure
pub mod core;

// Self-adjusting controller
pub mod controller;

pub use controller::{DeviceReport, Diagnostics, ScanReport, SmartI2c};
pub use smart_i2c_core as tuning;
