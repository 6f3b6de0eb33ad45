//! # Custom Relay 8
//!
//! Host-side controller for the Custom Relay 8 card, an 8-relay board driven
//! over a serial link with a single-byte command/response protocol.
//!
//! ## Features
//!
//! - **Serialized Transactions**: Every exchange holds a lock on the link, so
//!   concurrent callers never interleave command and response bytes.
//! - **Bounded Duration**: Each open-write-read-close cycle runs under a hard
//!   timeout and always closes the port.
//! - **Validated Responses**: Set and clear are confirmed against the state
//!   byte the card reports back.
//! - **Simulation**: An in-memory card for tests and dry runs.
//!
//! ## Architecture
//!
//! - [`serial`]: Transport trait, serial port backend and simulated card
//! - [`relay`]: Command encoding, controller and per-relay switches
//! - [`error`]: Error types for the controller

pub mod error;
pub mod relay;
pub mod serial;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::error::*;
    pub use crate::relay::{
        ControllerSettings, Relay, RelayController, RelayStates, RelaySwitch, create_switches,
    };
    pub use crate::serial::{PortSettings, SerialTransport, SimulatedCard, Transport};
}
