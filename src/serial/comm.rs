// Serial byte transport.
//
// Wraps the serialport crate in deadline-bounded async reads. The engine
// never touches the OS port directly; everything goes through the
// Transport trait so protocol logic can run against a scripted double.

use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("serial transport unsupported on this platform")]
    Unsupported,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("port unavailable: {0}")]
    PortUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("deadline of {0:?} expired")]
    Timeout(Duration),

    #[error("port not open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Link settings. Clone protocols are invariably 8-N-1 with no flow
/// control, so only baud and the control lines vary.
#[derive(Debug, Clone, Copy)]
pub struct LinkSettings {
    pub baud: u32,
    pub dtr: bool,
    pub rts: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud: 9600,
            dtr: true,
            rts: true,
        }
    }
}

impl LinkSettings {
    pub fn new(baud: u32) -> Self {
        Self {
            baud,
            ..Default::default()
        }
    }
}

/// Duplex byte stream with deadline-bounded reads.
///
/// Writes return once the bytes are accepted by the layer below; reads
/// never block past their deadline. `read_available` treats an expired
/// deadline as a short (possibly empty) read, the other reads fail with
/// `Timeout` and discard whatever partial data arrived.
#[allow(async_fn_in_trait)]
pub trait Transport: Send {
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    async fn read_exact(&mut self, n: usize, deadline: Duration) -> Result<Vec<u8>>;

    async fn read_available(&mut self, max: usize, deadline: Duration) -> Result<Vec<u8>>;

    async fn read_until(&mut self, suffix: &[u8], max: usize, deadline: Duration)
        -> Result<Vec<u8>>;

    fn set_signals(&mut self, dtr: bool, rts: bool) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// Poll interval while waiting on the OS port.
const POLL: Duration = Duration::from_millis(5);

/// Transport backed by a real serial port.
pub struct SerialLink {
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
}

impl SerialLink {
    pub fn open(name: &str, settings: LinkSettings) -> Result<Self> {
        let mut port = serialport::new(name, settings.baud)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(POLL)
            .open()
            .map_err(|e| match e.kind {
                serialport::ErrorKind::NoDevice => TransportError::PortUnavailable(e.to_string()),
                serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
                    TransportError::PermissionDenied(e.to_string())
                }
                _ => TransportError::PortUnavailable(e.to_string()),
            })?;

        port.write_data_terminal_ready(settings.dtr)
            .map_err(|e| TransportError::PortUnavailable(e.to_string()))?;
        port.write_request_to_send(settings.rts)
            .map_err(|e| TransportError::PortUnavailable(e.to_string()))?;

        tracing::debug!(port = name, baud = settings.baud, "opened serial link");

        Ok(Self {
            port: Some(port),
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
        self.port.as_mut().ok_or(TransportError::NotOpen)
    }

    /// Discard anything sitting in the OS input buffer.
    pub fn flush_input(&mut self) -> Result<()> {
        self.port_mut()?
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| TransportError::PortUnavailable(e.to_string()))
    }
}

impl Transport for SerialLink {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        Ok(())
    }

    async fn read_exact(&mut self, n: usize, deadline: Duration) -> Result<Vec<u8>> {
        let limit = tokio::time::Instant::now() + deadline;
        let mut buf = vec![0u8; n];
        let mut filled = 0;

        while filled < n {
            if tokio::time::Instant::now() >= limit {
                return Err(TransportError::Timeout(deadline));
            }
            let port = self.port_mut()?;
            match port.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(TransportError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "port closed",
                    )))
                }
                Ok(k) => filled += k,
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    tokio::time::sleep(POLL).await;
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(buf)
    }

    async fn read_available(&mut self, max: usize, deadline: Duration) -> Result<Vec<u8>> {
        let limit = tokio::time::Instant::now() + deadline;
        let mut out = Vec::new();
        let mut buf = [0u8; 256];

        while out.len() < max {
            if tokio::time::Instant::now() >= limit {
                break;
            }
            let want = (max - out.len()).min(buf.len());
            let port = self.port_mut()?;
            match port.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(k) => out.extend_from_slice(&buf[..k]),
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    tokio::time::sleep(POLL).await;
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(out)
    }

    async fn read_until(
        &mut self,
        suffix: &[u8],
        max: usize,
        deadline: Duration,
    ) -> Result<Vec<u8>> {
        let limit = tokio::time::Instant::now() + deadline;
        let mut out = Vec::new();
        let mut byte = [0u8; 1];

        while out.len() < max {
            if tokio::time::Instant::now() >= limit {
                return Err(TransportError::Timeout(deadline));
            }
            let port = self.port_mut()?;
            match port.read(&mut byte) {
                Ok(0) => {
                    return Err(TransportError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "port closed",
                    )))
                }
                Ok(_) => {
                    out.push(byte[0]);
                    if out.ends_with(suffix) {
                        return Ok(out);
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    tokio::time::sleep(POLL).await;
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Err(TransportError::Timeout(deadline))
    }

    fn set_signals(&mut self, dtr: bool, rts: bool) -> Result<()> {
        let port = self.port_mut()?;
        port.write_data_terminal_ready(dtr)
            .map_err(|e| TransportError::PortUnavailable(e.to_string()))?;
        port.write_request_to_send(rts)
            .map_err(|e| TransportError::PortUnavailable(e.to_string()))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.port.take();
        Ok(())
    }
}

/// List system serial ports by name.
pub fn list_ports() -> Result<Vec<String>> {
    Ok(serialport::available_ports()
        .map_err(|e| TransportError::PortUnavailable(e.to_string()))?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}
