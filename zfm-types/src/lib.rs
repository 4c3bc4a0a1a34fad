//! Type definitions for zfm

pub mod error;
pub mod template;

pub use error::{Error, Result};
pub use template::{MatchCandidate, SlotId};
