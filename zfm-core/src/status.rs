//! Device confirmation codes
//!
//! The first payload byte of every acknowledgement packet is a confirmation
//! code. The mapping here is a fixed lookup: a byte this module does not
//! recognize becomes [`StatusCode::Unknown`], never a success.

use std::fmt;

/// Confirmation code returned by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Command executed successfully
    Ok,

    /// Module failed to receive the command packet intact
    PacketError,

    /// No finger on the sensor window
    NoFinger,

    /// Finger present but image capture failed
    ImageFail,

    /// Image too disordered to extract features
    ImageMess,

    /// Image too small / too few feature points
    FeatureFail,

    /// Buffers 1 and 2 do not describe the same finger
    NoMatch,

    /// Search finished without a matching template
    NotFound,

    /// Model creation failed: the two samples do not merge
    EnrollMismatch,

    /// Storage slot index out of range
    BadLocation,

    /// Handshake password rejected
    WrongPassword,

    /// Image buffer does not hold a valid image
    InvalidImage,

    /// Flash write failed while storing the template
    FlashError,

    /// Any confirmation code not listed in the datasheet table
    Unknown(u8),
}

impl StatusCode {
    /// Fixed lookup from the raw confirmation byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Ok,
            0x01 => Self::PacketError,
            0x02 => Self::NoFinger,
            0x03 => Self::ImageFail,
            0x06 => Self::ImageMess,
            0x07 => Self::FeatureFail,
            0x08 => Self::NoMatch,
            0x09 => Self::NotFound,
            0x0A => Self::EnrollMismatch,
            0x0B => Self::BadLocation,
            0x13 => Self::WrongPassword,
            0x15 => Self::InvalidImage,
            0x18 => Self::FlashError,
            other => Self::Unknown(other),
        }
    }

    /// Raw confirmation byte
    pub fn byte(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::PacketError => 0x01,
            Self::NoFinger => 0x02,
            Self::ImageFail => 0x03,
            Self::ImageMess => 0x06,
            Self::FeatureFail => 0x07,
            Self::NoMatch => 0x08,
            Self::NotFound => 0x09,
            Self::EnrollMismatch => 0x0A,
            Self::BadLocation => 0x0B,
            Self::WrongPassword => 0x13,
            Self::InvalidImage => 0x15,
            Self::FlashError => 0x18,
            Self::Unknown(b) => b,
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Datasheet mnemonic
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::PacketError => "PACKET_ERROR",
            Self::NoFinger => "NO_FINGER",
            Self::ImageFail => "IMAGE_FAIL",
            Self::ImageMess => "IMAGE_MESS",
            Self::FeatureFail => "FEATURE_FAIL",
            Self::NoMatch => "NO_MATCH",
            Self::NotFound => "NOT_FOUND",
            Self::EnrollMismatch => "ENROLL_MISMATCH",
            Self::BadLocation => "BAD_LOCATION",
            Self::WrongPassword => "WRONG_PASSWORD",
            Self::InvalidImage => "INVALID_IMAGE",
            Self::FlashError => "FLASH_ERROR",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.byte())
    }
}
