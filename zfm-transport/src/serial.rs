//! Serial port transport

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Default baud rate for the module family (the factory setting)
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Serial transport for ZFM fingerprint modules
///
/// The link is half-duplex at a fixed baud rate; frame boundaries are the
/// codec's business, this type only moves bytes.
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    /// Create a new serial transport for the port at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            stream: None,
        }
    }

    /// Set the baud rate (default 57600)
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }

        debug!("Opening {} at {} baud...", self.path, self.baud_rate);

        let stream = tokio_serial::new(&self.path, self.baud_rate).open_native_async()?;

        debug!("Opened {}", self.path);

        self.stream = Some(stream);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing {}...", self.path);
            let _ = stream.shutdown().await;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn receive(&mut self, read_timeout: Duration) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

        let mut buf = BytesMut::with_capacity(zfm_core::MAX_FRAME_SIZE);

        let n = timeout(read_timeout, stream.read_buf(&mut buf))
            .await
            .map_err(|_| Error::ReadTimeout)?
            .map_err(Error::Io)?;

        if n == 0 {
            return Err(Error::LinkClosed);
        }

        trace!("Received {} bytes: {:02X?}", n, &buf[..n.min(16)]);

        Ok(buf)
    }

    fn port_name(&self) -> String {
        self.path.clone()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("Serial transport dropped while still open");
        }
    }
}
