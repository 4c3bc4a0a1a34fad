//! ZFM instruction definitions
//!
//! Instruction codes follow the module datasheet (the same table the stock
//! Arduino library uses).

use bytes::{BufMut, BytesMut};
use std::fmt;

use crate::packet::Packet;

/// Character buffer slot used during enrollment
///
/// The module holds two feature buffers; enrollment converts the first
/// capture into buffer 1 and the second into buffer 2 before fusing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CharBuffer {
    One = 0x01,
    Two = 0x02,
}

impl fmt::Display for CharBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Instructions the host can send to the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Handshake: verify the module password
    VerifyPassword { password: u32 },

    /// Capture a fingerprint image into the image buffer
    CaptureImage,

    /// Convert the image buffer into a feature buffer
    ConvertImage { buffer: CharBuffer },

    /// Fuse buffers 1 and 2 into a template model
    CreateModel,

    /// Write the fused model to a template slot
    StoreModel { buffer: CharBuffer, slot: u16 },

    /// High-speed search of a feature buffer against stored templates
    FastSearch {
        buffer: CharBuffer,
        start: u16,
        count: u16,
    },

    /// Read the number of stored templates
    TemplateCount,
}

impl Instruction {
    /// Instruction code byte
    pub fn code(self) -> u8 {
        match self {
            Self::CaptureImage => 0x01,
            Self::ConvertImage { .. } => 0x02,
            Self::CreateModel => 0x05,
            Self::StoreModel { .. } => 0x06,
            Self::VerifyPassword { .. } => 0x13,
            Self::FastSearch { .. } => 0x1B,
            Self::TemplateCount => 0x1D,
        }
    }

    /// Datasheet mnemonic, used in logs and error reports
    pub fn name(self) -> &'static str {
        match self {
            Self::VerifyPassword { .. } => "VfyPwd",
            Self::CaptureImage => "GenImg",
            Self::ConvertImage { .. } => "Img2Tz",
            Self::CreateModel => "RegModel",
            Self::StoreModel { .. } => "Store",
            Self::FastSearch { .. } => "HiSpeedSearch",
            Self::TemplateCount => "TemplateNum",
        }
    }

    /// Serialize the instruction code and its arguments
    pub fn payload(self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(9);
        buf.put_u8(self.code());

        match self {
            Self::VerifyPassword { password } => {
                buf.put_u32(password);
            }
            Self::ConvertImage { buffer } => {
                buf.put_u8(buffer as u8);
            }
            Self::StoreModel { buffer, slot } => {
                buf.put_u8(buffer as u8);
                buf.put_u16(slot);
            }
            Self::FastSearch {
                buffer,
                start,
                count,
            } => {
                buf.put_u8(buffer as u8);
                buf.put_u16(start);
                buf.put_u16(count);
            }
            Self::CaptureImage | Self::CreateModel | Self::TemplateCount => {}
        }

        buf
    }

    /// Build the command packet for a module at `address`
    pub fn to_packet(self, address: u32) -> Packet {
        Packet::command(address, self.payload().freeze())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_ADDRESS;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capture_image_frame() {
        let frame = Instruction::CaptureImage.to_packet(DEFAULT_ADDRESS).encode();
        assert_eq!(
            frame.as_ref(),
            &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]
        );
    }

    #[test]
    fn test_verify_password_frame() {
        let frame = Instruction::VerifyPassword { password: 0 }
            .to_packet(DEFAULT_ADDRESS)
            .encode();
        assert_eq!(
            frame.as_ref(),
            &[
                0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x07, 0x13, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x1B
            ]
        );
    }

    #[test]
    fn test_convert_image_payload() {
        let payload = Instruction::ConvertImage {
            buffer: CharBuffer::Two,
        }
        .payload();
        assert_eq!(payload.as_ref(), &[0x02, 0x02]);
    }

    #[test]
    fn test_store_model_payload() {
        let payload = Instruction::StoreModel {
            buffer: CharBuffer::One,
            slot: 0x0102,
        }
        .payload();
        assert_eq!(payload.as_ref(), &[0x06, 0x01, 0x01, 0x02]);
    }

    #[test]
    fn test_fast_search_payload() {
        let payload = Instruction::FastSearch {
            buffer: CharBuffer::One,
            start: 0,
            count: 0x00A3,
        }
        .payload();
        assert_eq!(payload.as_ref(), &[0x1B, 0x01, 0x00, 0x00, 0x00, 0xA3]);
    }

    #[test]
    fn test_template_count_payload() {
        assert_eq!(Instruction::TemplateCount.payload().as_ref(), &[0x1D]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::CaptureImage.to_string(), "GenImg(0x01)");
    }
}
