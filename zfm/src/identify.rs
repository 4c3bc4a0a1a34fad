//! Single-cycle identification workflow
//!
//! One call, one cycle: capture, convert, search. No state crosses from
//! one cycle to the next except what the module itself retains, so this
//! is safe to call from any polling loop.

use tracing::debug;

use zfm_core::CharBuffer;
use zfm_types::MatchCandidate;

use crate::device::{Capture, Device, SearchOutcome};
use crate::error::Result;

/// Outcome of one identification cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyOutcome {
    /// Nothing on the sensor window; not an error
    NoFinger,

    /// A stored template matched
    Match(MatchCandidate),

    /// The probe matched no stored template; a valid negative result
    NotFound,
}

/// Run one capture-convert-search cycle against the stored templates
pub async fn identify_once(device: &mut Device) -> Result<IdentifyOutcome> {
    match device.capture_image().await? {
        Capture::NoFinger => return Ok(IdentifyOutcome::NoFinger),
        Capture::ImageReady => {}
    }

    device.convert_image(CharBuffer::One).await?;

    let outcome = match device.fast_search().await? {
        SearchOutcome::Match(candidate) => IdentifyOutcome::Match(candidate),
        SearchOutcome::NotFound => IdentifyOutcome::NotFound,
    };

    debug!(?outcome, "Identification cycle finished");
    Ok(outcome)
}
