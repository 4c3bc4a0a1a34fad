//! High-level error types
//!
//! `NoFinger` and a search that finds nothing are *not* errors; they are
//! expected outcomes carried in [`crate::device::Capture`] and
//! [`crate::device::SearchOutcome`]. Everything here terminates the current
//! operation.

use zfm_core::{CharBuffer, PacketKind, StatusCode};
use zfm_types::SlotId;

use crate::enroll::EnrollError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Protocol(#[from] zfm_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zfm_transport::Error),

    #[error("Reply parse error: {0}")]
    Types(#[from] zfm_types::Error),

    #[error("Expected an acknowledgement, got a {0} packet")]
    UnexpectedReply(PacketKind),

    #[error("Malformed {command} acknowledgement: {reason}")]
    MalformedReply {
        command: &'static str,
        reason: &'static str,
    },

    /// The module reports it could not receive our command intact
    #[error("Module reported a packet receive error")]
    DevicePacketError,

    #[error("Module rejected the password")]
    PasswordRejected,

    #[error("Image capture failed")]
    Imaging,

    #[error("Image conversion into buffer {buffer} failed: {code}")]
    Conversion {
        buffer: CharBuffer,
        code: StatusCode,
    },

    #[error("Template fusion failed: {code}")]
    Fusion { code: StatusCode },

    #[error("Storing template to {slot} failed: {code}")]
    Storage { slot: SlotId, code: StatusCode },

    #[error("No finger detected after {attempts} capture attempts")]
    CaptureTimeout { attempts: u32 },

    #[error("Unexpected status from {command}: 0x{code:02X}")]
    UnknownStatus { command: &'static str, code: u8 },

    #[error("Enrollment failed: {0}")]
    Enrollment(Box<EnrollError>),
}

impl From<EnrollError> for Error {
    fn from(err: EnrollError) -> Self {
        Self::Enrollment(Box::new(err))
    }
}

impl Error {
    /// True for link-level failures: malformed or missing replies, I/O
    /// problems, timeouts. These say nothing about the finger on the sensor.
    pub fn is_communication(&self) -> bool {
        matches!(
            self,
            Self::Protocol(_)
                | Self::Transport(_)
                | Self::Types(_)
                | Self::UnexpectedReply(_)
                | Self::MalformedReply { .. }
                | Self::DevicePacketError
        )
    }
}
