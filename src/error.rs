//! Unified error types for the rotator firmware.
//!
//! Only start-up and server-loop failures are represented here.  Faults on
//! a single client connection are handled inside the command server by
//! releasing that session and never reach this type.

use core::fmt;
use std::io;

use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible bootstrap operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The command server could not start or its readiness wait failed.
    Server(ServerError),
    /// Peripheral initialisation failed.
    Hardware(HwInitError),
    /// The station interface could not be brought up.
    Network(NetworkError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(e) => write!(f, "server: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Command server errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerError {
    /// Creating, binding or listening on the server socket failed.
    Bind(io::ErrorKind),
    /// The readiness wait itself failed.
    Poll(io::ErrorKind),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind(kind) => write!(f, "unable to bind listener ({kind})"),
            Self::Poll(kind) => write!(f, "readiness wait failed ({kind})"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<ServerError> for Error {
    fn from(e: ServerError) -> Self {
        Self::Server(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// No SSID was compiled in.
    NoCredentials,
    /// SSID or password does not fit the driver's limits.
    InvalidCredentials,
    /// The driver refused to start or associate.
    ConnectFailed,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials out of range"),
            Self::ConnectFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
