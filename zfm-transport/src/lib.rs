//! Transport layer for the ZFM protocol
//!
//! Provides the raw byte channel the packet codec runs over. The transport
//! moves bytes and nothing else: it does not interpret frame content, and it
//! does not retry; retry policy belongs to the workflows above it.

pub mod error;
pub mod serial;

pub use error::{Error, Result};
pub use serial::SerialTransport;

use async_trait::async_trait;
use bytes::BytesMut;
use std::time::Duration;

/// Byte channel to a fingerprint module
#[async_trait]
pub trait Transport: Send {
    /// Open the physical link
    async fn open(&mut self) -> Result<()>;

    /// Close the physical link
    async fn close(&mut self) -> Result<()>;

    /// Check if the link is open
    fn is_open(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive whatever bytes arrive within `timeout`
    ///
    /// A timeout is an error ([`Error::ReadTimeout`]), never an empty
    /// success; a caller that treated silence as data would act on a
    /// phantom reply.
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Human-readable name of the endpoint (port path)
    fn port_name(&self) -> String;
}
