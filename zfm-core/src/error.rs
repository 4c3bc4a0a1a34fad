//! Error types for zfm-core

/// Result type alias for zfm-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Buffer is too short to hold a complete frame
    #[error("Packet too short: expected at least {expected} bytes, got {actual} bytes")]
    PacketTooShort {
        expected: usize,
        actual: usize,
    },

    /// Frame does not begin with the 0xEF01 start marker
    #[error("Bad start marker: expected 0xEF01, found 0x{found:04X}")]
    BadStartMarker {
        found: u16,
    },

    /// Frame carries a different module address than expected
    #[error("Address mismatch: expected 0x{expected:08X}, found 0x{found:08X}")]
    AddressMismatch {
        expected: u32,
        found: u32,
    },

    /// Packet identifier byte is not a known kind
    #[error("Unknown packet identifier: 0x{0:02X}")]
    UnknownPacketKind(u8),

    /// Declared length disagrees with the bytes actually present
    #[error("Length mismatch: length field declares {declared} bytes, frame holds {actual}")]
    LengthMismatch {
        declared: usize,
        actual: usize,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },

    /// Payload too large for a single frame
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
}
