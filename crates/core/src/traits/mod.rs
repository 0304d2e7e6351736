//! Core traits for platform-agnostic bus tuning.
//!
//! This module provides trait abstractions that decouple the tuning logic
//! from platform-specific clocks (Embassy, etc.).
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Platform implementations (Embassy) live in the `smart_i2c` crate

pub mod time;

pub use time::{MockTime, TimeSource};
