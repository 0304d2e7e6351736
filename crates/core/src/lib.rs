//! smart_i2c_core - Pure no_std tuning logic for the self-adjusting I2C controller
//!
//! This crate contains the platform-agnostic algorithms that pick I2C bus
//! timing (clock frequency, rise-time compensation) from transaction outcomes.
//! It can be tested on host without any feature flags or embedded dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Trait abstractions**: Platform services injected via traits
//!
//! # Modules
//!
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource)
//! - [`config`]: Tuner configuration, mode flags and validation errors
//! - [`range`]: Discretized parameter ranges (step <-> value mapping)
//! - [`metrics`]: Transaction counters and the performance history ring
//! - [`score`]: Composite performance scoring and trend analysis
//! - [`fault`]: Outcome-code classification and the recent-fault window
//! - [`snapshot`]: Timing configuration snapshots (live / best / per device)
//! - [`registry`]: Bounded per-address device registry
//! - [`decision`]: Periodic adjustment decision engine
//! - [`recovery`]: Recovery reflex planning on consecutive failures

#![no_std]

pub mod config;
pub mod decision;
pub mod fault;
pub mod metrics;
pub mod range;
pub mod recovery;
pub mod registry;
pub mod score;
pub mod snapshot;
pub mod traits;
