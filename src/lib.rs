//! Antenna rotator firmware library.
//!
//! Exposes the control and server logic for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, with a simulation twin for host builds.

#![deny(unused_must_use)]

pub mod config;
pub mod error;
pub mod pins;
pub mod ports;
pub mod rotator;
pub mod server;

pub mod adapters;
pub mod drivers;

pub use error::{Error, Result};
