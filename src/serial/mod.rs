//! # Serial Module
//!
//! The byte-stream capability the relay controller drives. A transport is
//! opened and closed around every transaction instead of being held open.

pub mod port;
pub mod simulated;

use async_trait::async_trait;

use crate::error::Result;

pub use port::{PortSettings, SerialTransport};
pub use simulated::SimulatedCard;

/// Byte-oriented link to a relay card.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Open the link.
    async fn open(&mut self) -> Result<()>;

    /// Close the link. Must be safe to call when the link is not open.
    fn close(&mut self);

    /// Write all of `data`.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read whatever bytes are available, possibly none.
    async fn read(&mut self) -> Result<Vec<u8>>;
}
