use async_trait::async_trait;
use log::{debug, error};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Duration;
use tokio_serial::SerialPortBuilderExt;
pub use tokio_serial::{DataBits, FlowControl, Parity, SerialStream, StopBits};

use super::Transport;
use crate::error::{RelayError, Result};

/// Baud rate the relay card firmware talks at.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// How long a read waits for the card before reporting no data.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest chunk pulled from the port in one read.
const READ_BUFFER_SIZE: usize = 64;

/// serial port settings
#[derive(Clone, Debug)]
pub struct PortSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    pub timeout: Duration,
}

impl PortSettings {
    /// Settings for the card on `port_name`, 9600 8N1 with a one second read timeout.
    pub fn new(port_name: impl Into<String>) -> Self {
        PortSettings {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    #[must_use]
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`Transport`] over a real serial port.
///
/// The port is opened on [`Transport::open`] and dropped on
/// [`Transport::close`], so nothing holds the device between transactions.
pub struct SerialTransport {
    settings: PortSettings,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    pub fn new(settings: PortSettings) -> Self {
        SerialTransport {
            settings,
            stream: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut SerialStream> {
        let port_name = &self.settings.port_name;
        self.stream
            .as_mut()
            .ok_or_else(|| RelayError::transport(format!("port {port_name} is not open")))
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<()> {
        let settings = &self.settings;
        match tokio_serial::new(&settings.port_name, settings.baud_rate)
            .data_bits(settings.data_bits)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits)
            .flow_control(settings.flow_control)
            .timeout(settings.timeout)
            .open_native_async()
        {
            Ok(stream) => {
                debug!("Opened serial port {}", settings.port_name);
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                error!("Unable to open serial port {}: {}", settings.port_name, e);
                Err(e.into())
            }
        }
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("Closed serial port {}", self.settings.port_name);
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream()?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read(&mut self) -> Result<Vec<u8>> {
        let timeout = self.settings.timeout;
        let stream = self.stream()?;
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        match tokio::time::timeout(timeout, stream.read(&mut buffer)).await {
            Ok(Ok(count)) => Ok(buffer[..count].to_vec()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                debug!("No data on serial port within {:?}", timeout);
                Ok(Vec::new())
            }
        }
    }
}
