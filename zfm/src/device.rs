//! High-level module interface
//!
//! One method per device operation. Every method sends exactly one command
//! frame and waits for exactly one acknowledgement; the link is strictly
//! request/response and nothing here retries; bounded retry loops live in
//! the workflows.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use zfm_core::{
    CharBuffer, Instruction, Packet, PacketKind, StatusCode, DEFAULT_ADDRESS, DEFAULT_PASSWORD,
    DEFAULT_SEARCH_COUNT, MAX_FRAME_SIZE,
};
use zfm_transport::{SerialTransport, Transport};
use zfm_types::{MatchCandidate, SlotId};

use crate::error::{Error, Result};

/// Terminal outcome of one capture attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The image buffer now holds a usable fingerprint image
    ImageReady,

    /// Nothing on the sensor window; an expected state while polling,
    /// not an error
    NoFinger,
}

/// Outcome of a fast search over the stored templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A stored template matched the probe
    Match(MatchCandidate),

    /// No stored template matched; a valid negative result
    NotFound,
}

/// A ZFM fingerprint module on the other end of a transport
///
/// # Examples
///
/// ```no_run
/// use zfm::Device;
///
/// #[tokio::main]
/// async fn main() -> zfm::Result<()> {
///     let mut device = Device::serial("/dev/ttyUSB0");
///
///     device.connect().await?;
///     println!("Templates stored: {}", device.template_count().await?);
///
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    address: u32,
    password: u32,
    timeout: Duration,
}

impl Device {
    /// Create a device over an arbitrary transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            address: DEFAULT_ADDRESS,
            password: DEFAULT_PASSWORD,
            timeout: Duration::from_secs(1),
        }
    }

    /// Create a device on a serial port at the factory baud rate
    pub fn serial(path: impl Into<String>) -> Self {
        Self::new(SerialTransport::new(path))
    }

    /// Set the module address (default 0xFFFFFFFF)
    pub fn with_address(mut self, address: u32) -> Self {
        self.address = address;
        self
    }

    /// Set the handshake password (default 0)
    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    /// Set the per-command reply deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Open the link and verify the password
    ///
    /// A rejected password means there is no usable link; per the system
    /// policy this is fatal to the run; no retry makes sense without a
    /// confirmed handshake.
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to module on {}...", self.transport.port_name());

        self.transport.open().await?;
        self.verify_password().await?;

        info!("Module handshake complete");
        Ok(())
    }

    /// Close the link
    pub async fn disconnect(&mut self) -> Result<()> {
        info!("Disconnecting from {}...", self.transport.port_name());
        self.transport.close().await?;
        Ok(())
    }

    /// Handshake with the module password
    pub async fn verify_password(&mut self) -> Result<()> {
        let password = self.password;
        let (status, _) = self
            .execute(Instruction::VerifyPassword { password })
            .await?;

        match status {
            StatusCode::Ok => Ok(()),
            StatusCode::WrongPassword => Err(Error::PasswordRejected),
            other => Err(self.unknown_status("VfyPwd", other)),
        }
    }

    /// Number of templates currently stored on the module
    ///
    /// Always re-queries the device; the count is never cached host-side.
    pub async fn template_count(&mut self) -> Result<u16> {
        let (status, extra) = self.execute(Instruction::TemplateCount).await?;

        match status {
            StatusCode::Ok => {
                if extra.len() < 2 {
                    return Err(Error::MalformedReply {
                        command: "TemplateNum",
                        reason: "count field missing",
                    });
                }
                Ok(u16::from_be_bytes([extra[0], extra[1]]))
            }
            other => Err(self.unknown_status("TemplateNum", other)),
        }
    }

    /// Attempt to capture a fingerprint image
    pub async fn capture_image(&mut self) -> Result<Capture> {
        let (status, _) = self.execute(Instruction::CaptureImage).await?;

        match status {
            StatusCode::Ok => Ok(Capture::ImageReady),
            StatusCode::NoFinger => Ok(Capture::NoFinger),
            StatusCode::ImageFail => Err(Error::Imaging),
            other => Err(self.unknown_status("GenImg", other)),
        }
    }

    /// Convert the captured image into a feature buffer
    pub async fn convert_image(&mut self, buffer: CharBuffer) -> Result<()> {
        let (status, _) = self.execute(Instruction::ConvertImage { buffer }).await?;

        match status {
            StatusCode::Ok => Ok(()),
            StatusCode::ImageMess | StatusCode::FeatureFail | StatusCode::InvalidImage => {
                Err(Error::Conversion {
                    buffer,
                    code: status,
                })
            }
            other => Err(self.unknown_status("Img2Tz", other)),
        }
    }

    /// Fuse feature buffers 1 and 2 into a template model
    pub async fn create_model(&mut self) -> Result<()> {
        let (status, _) = self.execute(Instruction::CreateModel).await?;

        match status {
            StatusCode::Ok => Ok(()),
            StatusCode::EnrollMismatch => Err(Error::Fusion { code: status }),
            other => Err(self.unknown_status("RegModel", other)),
        }
    }

    /// Store the fused model at `slot`
    pub async fn store_model(&mut self, slot: SlotId) -> Result<()> {
        let (status, _) = self
            .execute(Instruction::StoreModel {
                buffer: CharBuffer::One,
                slot: slot.as_u16(),
            })
            .await?;

        match status {
            StatusCode::Ok => Ok(()),
            StatusCode::BadLocation | StatusCode::FlashError => Err(Error::Storage {
                slot,
                code: status,
            }),
            other => Err(self.unknown_status("Store", other)),
        }
    }

    /// Search buffer 1 against the whole stored library
    pub async fn fast_search(&mut self) -> Result<SearchOutcome> {
        let (status, extra) = self
            .execute(Instruction::FastSearch {
                buffer: CharBuffer::One,
                start: 0,
                count: DEFAULT_SEARCH_COUNT,
            })
            .await?;

        match status {
            StatusCode::Ok => Ok(SearchOutcome::Match(MatchCandidate::from_payload(&extra)?)),
            StatusCode::NotFound => Ok(SearchOutcome::NotFound),
            other => Err(self.unknown_status("HiSpeedSearch", other)),
        }
    }

    // Helper methods

    fn unknown_status(&self, command: &'static str, status: StatusCode) -> Error {
        // A known code arriving where it makes no sense is just as
        // untrustworthy as an unlisted one; neither may pass as success
        match status {
            StatusCode::PacketError => Error::DevicePacketError,
            other => Error::UnknownStatus {
                command,
                code: other.byte(),
            },
        }
    }

    /// Send one command and read its single acknowledgement, returning the
    /// confirmation code and any extra payload bytes
    async fn execute(&mut self, instruction: Instruction) -> Result<(StatusCode, Bytes)> {
        debug!(command = instruction.name(), "Sending command");

        let frame = instruction.to_packet(self.address).encode();
        trace!(tx = %hex::encode(&frame), "Frame out");
        self.transport.send(&frame).await?;

        let reply = self.receive_reply().await?;
        if reply.kind != PacketKind::Ack {
            return Err(Error::UnexpectedReply(reply.kind));
        }

        let payload = reply.payload;
        if payload.is_empty() {
            return Err(Error::MalformedReply {
                command: instruction.name(),
                reason: "empty acknowledgement payload",
            });
        }

        let status = StatusCode::from_byte(payload[0]);
        debug!(command = instruction.name(), status = %status, "Acknowledged");

        Ok((status, payload.slice(1..)))
    }

    /// Accumulate bytes until the length field says one full frame is
    /// present, then decode it
    ///
    /// The whole exchange runs against a single deadline; packet boundaries
    /// come solely from the length field, never from read chunking.
    async fn receive_reply(&mut self) -> Result<Packet> {
        let deadline = Instant::now() + self.timeout;
        let mut buf = BytesMut::with_capacity(MAX_FRAME_SIZE);

        loop {
            if let Some(total) = Packet::frame_length(&buf)? {
                if buf.len() >= total {
                    break;
                }
            }

            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(zfm_transport::Error::ReadTimeout)?;

            let chunk = self.transport.receive(remaining).await?;
            buf.extend_from_slice(&chunk);
        }

        trace!(rx = %hex::encode(&buf), "Frame in");
        Ok(Packet::decode(buf, self.address)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTransport;

    fn device(mock: MockTransport) -> Device {
        Device::new(mock).with_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_verify_password_ok() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x00, &[]);

        let mut dev = device(mock);
        dev.verify_password().await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_password_rejected() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x13, &[]);

        let mut dev = device(mock);
        let result = dev.verify_password().await;
        assert!(matches!(result, Err(Error::PasswordRejected)));
    }

    #[tokio::test]
    async fn test_template_count() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x00, &[0x00, 0x05]);

        let mut dev = device(mock);
        assert_eq!(dev.template_count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_capture_no_finger_is_not_an_error() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x02, &[]);

        let mut dev = device(mock);
        assert_eq!(dev.capture_image().await.unwrap(), Capture::NoFinger);
    }

    #[tokio::test]
    async fn test_capture_imaging_error() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x03, &[]);

        let mut dev = device(mock);
        assert!(matches!(dev.capture_image().await, Err(Error::Imaging)));
    }

    #[tokio::test]
    async fn test_unknown_status_is_never_success() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x42, &[]);

        let mut dev = device(mock);
        let result = dev.capture_image().await;
        assert!(matches!(
            result,
            Err(Error::UnknownStatus { command: "GenImg", code: 0x42 })
        ));
    }

    #[tokio::test]
    async fn test_fast_search_match() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x00, &[0x00, 0x01, 0x00, 0x78]);

        let mut dev = device(mock);
        let outcome = dev.fast_search().await.unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Match(MatchCandidate::new(1u16, 120))
        );
    }

    #[tokio::test]
    async fn test_fast_search_not_found() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x09, &[]);

        let mut dev = device(mock);
        assert_eq!(dev.fast_search().await.unwrap(), SearchOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_store_model_flash_error_carries_code() {
        let mut mock = MockTransport::new();
        mock.push_ack(0x18, &[]);

        let mut dev = device(mock);
        let result = dev.store_model(SlotId(1)).await;
        match result {
            Err(Error::Storage { slot, code }) => {
                assert_eq!(slot, SlotId(1));
                assert_eq!(code, StatusCode::FlashError);
            }
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reply_split_across_reads_is_reassembled() {
        let mut mock = MockTransport::new();
        let frame = Packet::ack(DEFAULT_ADDRESS, vec![0x00, 0x00, 0x03]).encode();
        let (head, tail) = frame.split_at(6);
        mock.push_raw(head.to_vec());
        mock.push_raw(tail.to_vec());

        let mut dev = device(mock);
        assert_eq!(dev.template_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_silence_surfaces_as_communication_error() {
        let mut mock = MockTransport::new();
        mock.push_silence();

        let mut dev = device(mock);
        let result = dev.capture_image().await;
        assert!(result.as_ref().err().map(Error::is_communication).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_corrupt_reply_surfaces_as_communication_error() {
        let mut mock = MockTransport::new();
        let mut frame = Packet::ack(DEFAULT_ADDRESS, vec![0x00]).encode().to_vec();
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        mock.push_raw(frame);

        let mut dev = device(mock);
        let result = dev.capture_image().await;
        match result {
            Err(Error::Protocol(zfm_core::Error::ChecksumMismatch { .. })) => {}
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_ack_reply_is_rejected() {
        let mut mock = MockTransport::new();
        let frame = Packet::command(DEFAULT_ADDRESS, vec![0x00]).encode();
        mock.push_raw(frame.to_vec());

        let mut dev = device(mock);
        let result = dev.capture_image().await;
        assert!(matches!(
            result,
            Err(Error::UnexpectedReply(PacketKind::Command))
        ));
    }
}
