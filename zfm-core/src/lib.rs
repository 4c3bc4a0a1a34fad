//! # zfm-core
//!
//! Core protocol implementation for ZFM/R502-series serial fingerprint
//! sensor modules.
//!
//! This crate provides the low-level protocol primitives:
//! - Packet structure and encoding/decoding
//! - Checksum calculation
//! - Instruction definitions
//! - Device confirmation (status) codes

pub mod checksum;
pub mod command;
pub mod error;
pub mod packet;
pub mod status;

pub use command::{CharBuffer, Instruction};
pub use error::{Error, Result};
pub use packet::{Packet, PacketKind};
pub use status::StatusCode;

/// Start-of-frame marker present on every packet
pub const START_MARKER: u16 = 0xEF01;

/// Factory-default module address
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Factory-default module password
pub const DEFAULT_PASSWORD: u32 = 0x0000_0000;

/// Bytes before the payload: marker (2) + address (4) + pid (1) + length (2)
pub const FRAME_PREFIX_SIZE: usize = 9;

/// Trailing checksum size
pub const CHECKSUM_SIZE: usize = 2;

/// Maximum payload a frame may carry (length field counts payload + checksum)
pub const MAX_PAYLOAD_SIZE: usize = 256;

/// Largest frame the codec will produce or accept
pub const MAX_FRAME_SIZE: usize = FRAME_PREFIX_SIZE + MAX_PAYLOAD_SIZE + CHECKSUM_SIZE;

/// Default search window used by fast search (start page 0, 163 pages),
/// matching the stock library capacity of the module family
pub const DEFAULT_SEARCH_COUNT: u16 = 0x00A3;
