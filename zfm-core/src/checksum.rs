//! ZFM frame checksum
//!
//! From the module datasheet: the checksum is the arithmetic sum of every
//! byte from the packet identifier through the end of the payload (the
//! start marker and address are excluded), truncated to 16 bits.

use tracing::trace;

/// Calculate the checksum for a frame
///
/// `kind` is the packet identifier byte, `length` the value of the length
/// field (payload bytes + 2), `payload` the payload bytes.
pub fn calculate(kind: u8, length: u16, payload: &[u8]) -> u16 {
    let mut sum = kind as u16;
    let [len_hi, len_lo] = length.to_be_bytes();
    sum = sum.wrapping_add(len_hi as u16);
    sum = sum.wrapping_add(len_lo as u16);

    for byte in payload {
        sum = sum.wrapping_add(*byte as u16);
    }

    trace!(
        kind = kind,
        length = length,
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", sum),
        "Calculated checksum"
    );

    sum
}

/// Verify a received checksum
pub fn verify(kind: u8, length: u16, payload: &[u8], expected: u16) -> bool {
    calculate(kind, length, payload) == expected
}
