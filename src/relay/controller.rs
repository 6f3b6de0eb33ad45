//! # Controller Module
//!
//! [`RelayController`] serializes every exchange with the card into one
//! transaction: take the lock, open the transport, write the command byte,
//! wait for the card to settle, read the answer, close the transport.
//!
//! The whole open..close sequence runs under a hard time bound. The transport
//! is closed by a drop guard, so it is released on errors and on timeout
//! cancellation alike, and the lock is released before any error reaches
//! the caller.

use std::ops::{Deref, DerefMut};

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::time::Duration;

use super::command::{Command, Relay, RelayStates};
use crate::error::{RelayError, Result};
use crate::serial::{PortSettings, SerialTransport, Transport};

/// Upper bound for one complete transaction.
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Pause between writing a command and reading the answer.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Timing of controller transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerSettings {
    pub transaction_timeout: Duration,
    pub settle_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Driver for one relay card behind a [`Transport`].
///
/// Share it between consumers with an `Arc`; all operations take `&self`.
pub struct RelayController<T: Transport> {
    transport: Mutex<T>,
    settings: ControllerSettings,
}

impl RelayController<SerialTransport> {
    /// Controller for the card on the serial port described by `port`.
    ///
    /// Nothing is opened here; every transaction opens the port itself.
    pub fn connect(port: PortSettings, settings: ControllerSettings) -> Self {
        info!("Connection created to \"{}\"", port.port_name);
        Self::with_settings(SerialTransport::new(port), settings)
    }
}

impl<T: Transport> RelayController<T> {
    pub fn new(transport: T) -> Self {
        Self::with_settings(transport, ControllerSettings::default())
    }

    pub fn with_settings(transport: T, settings: ControllerSettings) -> Self {
        RelayController {
            transport: Mutex::new(transport),
            settings,
        }
    }

    /// Run one transaction and return the raw answer, possibly empty.
    ///
    /// Waits for the lock without bound. Once the lock is held the transaction
    /// fails with [`RelayError::Timeout`] after
    /// [`ControllerSettings::transaction_timeout`].
    pub async fn execute(&self, command: u8) -> Result<Vec<u8>> {
        let mut transport = self.transport.lock().await;
        let timeout = self.settings.transaction_timeout;
        let exchange = transact(&mut *transport, command, self.settings.settle_delay);
        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Command {} timed out after {:?}", hex::encode([command]), timeout);
                Err(RelayError::Timeout { command, timeout })
            }
        }
    }

    /// Get all states.
    pub async fn get_states(&self) -> Result<RelayStates> {
        info!("Get all states");
        let command = Command::QueryStates.byte();
        let response = self.execute(command).await?;
        first_byte(&response, command).map(RelayStates::from)
    }

    /// Switch on `relay` of `card`.
    ///
    /// Only one card is addressable; `card` is not sent to the device.
    pub async fn set(&self, card: i32, relay: i32) -> Result<()> {
        info!("Switch on card {card} relay {relay}");
        self.switch(Command::Set(Relay::new(relay)?)).await
    }

    /// Switch off `relay` of `card`.
    ///
    /// Only one card is addressable; `card` is not sent to the device.
    pub async fn clear(&self, card: i32, relay: i32) -> Result<()> {
        info!("Switch off card {card} relay {relay}");
        self.switch(Command::Clear(Relay::new(relay)?)).await
    }

    async fn switch(&self, command: Command) -> Result<()> {
        let byte = command.byte();
        let response = self.execute(byte).await?;
        let states = RelayStates::from(first_byte(&response, byte)?);
        match command.expected_state() {
            Some((relay, expected)) if states.is_on(relay) != expected => {
                Err(RelayError::UnexpectedState {
                    relay: relay.number(),
                    expected,
                    states: states.mask(),
                })
            }
            _ => Ok(()),
        }
    }
}

fn first_byte(response: &[u8], command: u8) -> Result<u8> {
    response
        .first()
        .copied()
        .ok_or(RelayError::EmptyResponse { command })
}

/// Open transport that closes itself when dropped.
struct OpenTransport<'a, T: Transport> {
    transport: &'a mut T,
}

impl<'a, T: Transport> OpenTransport<'a, T> {
    /// Opens `transport`. It is closed again even if opening fails.
    async fn open(transport: &'a mut T) -> Result<Self> {
        let guard = OpenTransport { transport };
        guard.transport.open().await?;
        Ok(guard)
    }
}

impl<T: Transport> Deref for OpenTransport<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.transport
    }
}

impl<T: Transport> DerefMut for OpenTransport<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.transport
    }
}

impl<T: Transport> Drop for OpenTransport<'_, T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}

async fn transact<T: Transport>(
    transport: &mut T,
    command: u8,
    settle: Duration,
) -> Result<Vec<u8>> {
    let mut link = OpenTransport::open(transport).await?;
    debug!("Sending {}", hex::encode([command]));
    link.write(&[command]).await?;
    tokio::time::sleep(settle).await;
    let received = link.read().await?;
    debug!("Received {}", hex::encode(&received));
    Ok(received)
}
