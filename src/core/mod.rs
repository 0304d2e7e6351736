//! Core controller infrastructure
//!
//! Logging macros shared by the controller and platform modules.

pub mod logging;
