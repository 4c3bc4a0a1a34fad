//! ZFM protocol packet structure and encoding/decoding

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    error::{Error, Result},
    CHECKSUM_SIZE, FRAME_PREFIX_SIZE, MAX_PAYLOAD_SIZE, START_MARKER,
};

/// Packet identifier byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    /// Command from host to module
    Command = 0x01,

    /// Data packet (template up/download, not used by the ack path)
    Data = 0x02,

    /// Acknowledgement from module to host
    Ack = 0x07,

    /// Final data packet of a transfer
    EndOfData = 0x08,
}

impl PacketKind {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(Self::Command),
            0x02 => Ok(Self::Data),
            0x07 => Ok(Self::Ack),
            0x08 => Ok(Self::EndOfData),
            other => Err(Error::UnknownPacketKind(other)),
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Command => "COMMAND",
            Self::Data => "DATA",
            Self::Ack => "ACK",
            Self::EndOfData => "END_OF_DATA",
        };
        write!(f, "{}", name)
    }
}

/// ZFM protocol packet
///
/// # Frame Structure
///
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐
/// │  Marker  │ Address  │   PID    │  Length  │ Payload  │ Checksum │
/// │ 0xEF01   │ 4 bytes  │  1 byte  │ 2 bytes  │ N bytes  │ 2 bytes  │
/// │ (BE u16) │ (BE u32) │          │ (BE u16) │          │ (BE u16) │
/// └──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
/// ```
///
/// All multi-byte values are big-endian. The length field counts the
/// payload plus the two checksum bytes; the checksum covers the PID,
/// length, and payload.
///
/// # Examples
///
/// ```
/// use zfm_core::{Packet, PacketKind, DEFAULT_ADDRESS};
///
/// let packet = Packet::command(DEFAULT_ADDRESS, vec![0x01]);
/// let encoded = packet.encode();
///
/// let decoded = Packet::decode(encoded, DEFAULT_ADDRESS).unwrap();
/// assert_eq!(decoded.kind, PacketKind::Command);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet identifier
    pub kind: PacketKind,

    /// Module address the frame is addressed to / from
    pub address: u32,

    /// Packet payload (instruction or status plus arguments)
    pub payload: Bytes,
}

impl Packet {
    /// Create a command packet
    pub fn command(address: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: PacketKind::Command,
            address,
            payload: payload.into(),
        }
    }

    /// Create an acknowledgement packet (used by tests and simulators;
    /// real acks come from the module)
    pub fn ack(address: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: PacketKind::Ack,
            address,
            payload: payload.into(),
        }
    }

    /// Value of the length field: payload bytes plus the checksum
    pub fn length_field(&self) -> u16 {
        (self.payload.len() + CHECKSUM_SIZE) as u16
    }

    /// Calculate the checksum for this packet
    pub fn checksum(&self) -> u16 {
        checksum::calculate(self.kind as u8, self.length_field(), &self.payload)
    }

    /// Total encoded size of this packet
    pub fn size(&self) -> usize {
        FRAME_PREFIX_SIZE + self.payload.len() + CHECKSUM_SIZE
    }

    /// Encode packet to bytes
    ///
    /// Callers building payloads at runtime should guard with
    /// [`Packet::check_payload_size`] first; instruction payloads are all
    /// far below the limit.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u16(START_MARKER);
        buf.put_u32(self.address);
        buf.put_u8(self.kind as u8);
        buf.put_u16(self.length_field());
        buf.put_slice(&self.payload);
        buf.put_u16(self.checksum());

        buf
    }

    /// Peek an accumulating buffer and report the total frame size once the
    /// length field is readable
    ///
    /// Returns `Ok(None)` while fewer than [`FRAME_PREFIX_SIZE`] bytes are
    /// available. Fails fast on a bad start marker so a caller does not sit
    /// on garbage until its deadline expires.
    pub fn frame_length(buf: &[u8]) -> Result<Option<usize>> {
        if buf.len() >= 2 {
            let marker = u16::from_be_bytes([buf[0], buf[1]]);
            if marker != START_MARKER {
                return Err(Error::BadStartMarker { found: marker });
            }
        }

        if buf.len() < FRAME_PREFIX_SIZE {
            return Ok(None);
        }

        let declared = u16::from_be_bytes([buf[7], buf[8]]) as usize;
        Ok(Some(FRAME_PREFIX_SIZE + declared))
    }

    /// Decode a packet from exactly one frame's worth of bytes
    ///
    /// Checks the start marker, address, packet identifier, and declared
    /// length first, then recomputes the checksum over the
    /// identifier/length/payload region. No payload
    /// byte is interpreted before the checksum has passed; a frame that
    /// fails any check is discarded whole.
    ///
    /// # Errors
    ///
    /// [`Error::PacketTooShort`], [`Error::BadStartMarker`],
    /// [`Error::AddressMismatch`], [`Error::UnknownPacketKind`],
    /// [`Error::LengthMismatch`], or [`Error::ChecksumMismatch`].
    pub fn decode(mut buf: BytesMut, expected_address: u32) -> Result<Self> {
        let min = FRAME_PREFIX_SIZE + CHECKSUM_SIZE;
        if buf.len() < min {
            return Err(Error::PacketTooShort {
                expected: min,
                actual: buf.len(),
            });
        }

        let marker = buf.get_u16();
        if marker != START_MARKER {
            return Err(Error::BadStartMarker { found: marker });
        }

        let address = buf.get_u32();
        if address != expected_address {
            return Err(Error::AddressMismatch {
                expected: expected_address,
                found: address,
            });
        }

        let kind_byte = buf.get_u8();
        let kind = PacketKind::from_byte(kind_byte)?;

        let declared = buf.get_u16() as usize;
        if declared < CHECKSUM_SIZE || declared != buf.len() {
            return Err(Error::LengthMismatch {
                declared,
                actual: buf.len(),
            });
        }

        let payload = buf.split_to(declared - CHECKSUM_SIZE).freeze();
        let received = buf.get_u16();

        let calculated = checksum::calculate(kind as u8, declared as u16, &payload);
        if calculated != received {
            return Err(Error::ChecksumMismatch {
                expected: calculated,
                received,
            });
        }

        Ok(Self {
            kind,
            address,
            payload,
        })
    }

    /// Check the payload fits a single frame
    pub fn check_payload_size(payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("kind", &self.kind)
            .field("address", &format!("0x{:08X}", self.address))
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet[{}](address=0x{:08X}, len={})",
            self.kind,
            self.address,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_ADDRESS;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_encode_gen_img_known_vector() {
        // Captured from the module datasheet
        let packet = Packet::command(DEFAULT_ADDRESS, vec![0x01]);
        let encoded = packet.encode();

        assert_eq!(
            encoded.as_ref(),
            &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]
        );
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let original = Packet::command(DEFAULT_ADDRESS, vec![0x02, 0x01]);

        let encoded = original.encode();
        let decoded = Packet::decode(encoded, DEFAULT_ADDRESS).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn test_decode_ack() {
        let ack = Packet::ack(DEFAULT_ADDRESS, vec![0x00]);
        let decoded = Packet::decode(ack.encode(), DEFAULT_ADDRESS).unwrap();

        assert_eq!(decoded.kind, PacketKind::Ack);
        assert_eq!(decoded.payload.as_ref(), &[0x00]);
    }

    #[test]
    fn test_decode_rejects_corrupt_checksum() {
        let packet = Packet::command(DEFAULT_ADDRESS, vec![0x01]);
        let mut encoded = packet.encode();

        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;

        let result = Packet::decode(encoded, DEFAULT_ADDRESS);
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_decode_rejects_corrupt_payload() {
        let packet = Packet::command(DEFAULT_ADDRESS, vec![0x13, 0, 0, 0, 0]);
        let mut encoded = packet.encode();

        encoded[10] ^= 0x01; // second payload byte

        let result = Packet::decode(encoded, DEFAULT_ADDRESS);
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_decode_rejects_bad_marker() {
        let packet = Packet::command(DEFAULT_ADDRESS, vec![0x01]);
        let mut encoded = packet.encode();
        encoded[0] = 0xAA;

        let result = Packet::decode(encoded, DEFAULT_ADDRESS);
        assert!(matches!(result, Err(Error::BadStartMarker { found: 0xAA01 })));
    }

    #[test]
    fn test_decode_rejects_wrong_address() {
        let packet = Packet::command(0x12345678, vec![0x01]);
        let result = Packet::decode(packet.encode(), DEFAULT_ADDRESS);

        assert!(matches!(result, Err(Error::AddressMismatch { .. })));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let packet = Packet::command(DEFAULT_ADDRESS, vec![0x01]);
        let mut encoded = packet.encode();
        encoded[6] = 0x99;

        // Checksum no longer matters: the kind byte is rejected first,
        // before the payload region is touched
        let result = Packet::decode(encoded, DEFAULT_ADDRESS);
        assert!(matches!(result, Err(Error::UnknownPacketKind(0x99))));
    }

    #[test]
    fn test_decode_rejects_truncated_frame() {
        let packet = Packet::command(DEFAULT_ADDRESS, vec![0x01, 0x02, 0x03]);
        let mut encoded = packet.encode();
        encoded.truncate(encoded.len() - 2);

        let result = Packet::decode(encoded, DEFAULT_ADDRESS);
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));
    }

    #[test]
    fn test_decode_too_short() {
        let buf = BytesMut::from(&[0xEF, 0x01, 0xFF][..]);
        let result = Packet::decode(buf, DEFAULT_ADDRESS);

        assert!(matches!(result, Err(Error::PacketTooShort { .. })));
    }

    #[test]
    fn test_frame_length_peek() {
        let packet = Packet::command(DEFAULT_ADDRESS, vec![0x01]);
        let encoded = packet.encode();

        // Not enough for the prefix yet
        assert_eq!(Packet::frame_length(&encoded[..5]).unwrap(), None);

        // Full prefix reveals the frame size
        assert_eq!(
            Packet::frame_length(&encoded[..FRAME_PREFIX_SIZE]).unwrap(),
            Some(encoded.len())
        );
    }

    #[test]
    fn test_frame_length_bad_marker_fails_fast() {
        let result = Packet::frame_length(&[0x00, 0x00, 0x01]);
        assert!(matches!(result, Err(Error::BadStartMarker { .. })));
    }

    #[test]
    fn test_payload_size_guard() {
        assert!(Packet::check_payload_size(&[0u8; MAX_PAYLOAD_SIZE]).is_ok());
        assert!(Packet::check_payload_size(&[0u8; MAX_PAYLOAD_SIZE + 1]).is_err());
    }

    fn arb_kind() -> impl Strategy<Value = PacketKind> {
        prop_oneof![
            Just(PacketKind::Command),
            Just(PacketKind::Data),
            Just(PacketKind::Ack),
            Just(PacketKind::EndOfData),
        ]
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            kind in arb_kind(),
            address in any::<u32>(),
            payload in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let original = Packet { kind, address, payload: payload.into() };
            let decoded = Packet::decode(original.encode(), address).unwrap();
            prop_assert_eq!(original, decoded);
        }

        #[test]
        fn prop_bit_flip_in_checked_region_is_rejected(
            payload in proptest::collection::vec(any::<u8>(), 1..32),
            byte_offset in 0usize..40,
            bit in 0u8..8,
        ) {
            let packet = Packet::command(DEFAULT_ADDRESS, payload);
            let mut encoded = packet.encode();

            // Flip one bit somewhere in the payload or checksum region
            let region = FRAME_PREFIX_SIZE + byte_offset % (encoded.len() - FRAME_PREFIX_SIZE);
            encoded[region] ^= 1 << bit;

            let result = Packet::decode(encoded, DEFAULT_ADDRESS);
            let is_checksum_mismatch = matches!(result, Err(Error::ChecksumMismatch { .. }));
            prop_assert!(is_checksum_mismatch);
        }
    }
}
