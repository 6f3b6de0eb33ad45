//! # Error Module
//!
//! This module provides the error types for the relay controller.
//! It uses the `thiserror` crate for ergonomic error handling.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for relay controller operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Main error type for the relay controller.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Relay number outside of 1..=8.
    #[error("Invalid relay number {relay}: expected 1..=8")]
    InvalidArgument { relay: i32 },

    /// The card sent no response byte.
    #[error("No response received for command 0x{command:02x}")]
    EmptyResponse { command: u8 },

    /// The card answered but did not confirm the requested transition.
    #[error("Wrong response received: relay {relay} expected {expected}, card reported 0b{states:08b}")]
    UnexpectedState {
        relay: u8,
        expected: bool,
        states: u8,
    },

    /// The transaction did not complete within its time bound.
    #[error("Transaction for command 0x{command:02x} timed out after {timeout:?}")]
    Timeout { command: u8, timeout: Duration },

    /// Open, write or read failed on the serial link.
    #[error("Serial transport error: {0}")]
    TransportFailure(String),
}

/// Discriminant of [`RelayError`], handy for matching and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    EmptyResponse,
    UnexpectedState,
    Timeout,
    TransportFailure,
}

impl RelayError {
    /// Creates a new transport error.
    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure(msg.into())
    }

    /// Creates a new invalid relay number error.
    #[must_use]
    pub fn invalid_relay(relay: i32) -> Self {
        Self::InvalidArgument { relay }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            Self::UnexpectedState { .. } => ErrorKind::UnexpectedState,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::TransportFailure(_) => ErrorKind::TransportFailure,
        }
    }

    /// Whether a caller may reasonably retry the operation.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::EmptyResponse | ErrorKind::Timeout)
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        Self::TransportFailure(err.to_string())
    }
}

impl From<tokio_serial::Error> for RelayError {
    fn from(err: tokio_serial::Error) -> Self {
        Self::TransportFailure(err.to_string())
    }
}
