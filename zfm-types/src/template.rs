//! Template slot addressing and match results

use std::fmt;

use crate::error::{Error, Result};

/// Address of a template slot in the module's on-board library
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub u16);

impl SlotId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl From<u16> for SlotId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// A successful search hit: the matching slot and its confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCandidate {
    /// Slot holding the matched template
    pub slot: SlotId,

    /// Match confidence reported by the module (higher is better)
    pub score: u16,
}

impl MatchCandidate {
    pub fn new(slot: impl Into<SlotId>, score: u16) -> Self {
        Self {
            slot: slot.into(),
            score,
        }
    }

    /// Parse the extra bytes of a search acknowledgement: slot (BE u16)
    /// followed by score (BE u16)
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < 4 {
            return Err(Error::Parse(format!(
                "search result needs 4 bytes, got {}",
                payload.len()
            )));
        }

        Ok(Self {
            slot: SlotId(u16::from_be_bytes([payload[0], payload[1]])),
            score: u16::from_be_bytes([payload[2], payload[3]]),
        })
    }
}

impl fmt::Display for MatchCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (score {})", self.slot, self.score)
    }
}
