//! Port abstraction so the frame writer can run against a fake link in tests

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;

/// A byte link that frames are written to, one complete frame per call
#[async_trait]
pub trait SerialPortIO: Send {
    /// Write the whole frame and flush it out of the OS buffer
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Human-readable port name for logs
    fn name(&self) -> &str;
}

/// `SerialPortIO` over a `tokio_serial::SerialStream`
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
    name: String,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream, name: impl Into<String>) -> Self {
        Self {
            port,
            name: name.into(),
        }
    }
}

impl std::fmt::Debug for TokioSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioSerialPort")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SerialPortIO for TokioSerialPort {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.port.write_all(frame).await?;
        self.port.flush().await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
