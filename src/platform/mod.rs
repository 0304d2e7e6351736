//! Platform abstraction layer
//!
//! This module provides the bus transports the controller drives.
//! All hardware-specific code is isolated here; the tuning logic only sees
//! the [`BusTransport`] trait.

pub mod error;
pub mod hal;
pub mod traits;

// Time driver (feature-gated)
#[cfg(feature = "embassy")]
pub mod embassy;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{NackSource, TransportError};
pub use hal::HalBus;
pub use traits::BusTransport;
