//! # zfm
//!
//! Driver and workflows for ZFM/R502-series serial fingerprint sensor
//! modules.
//!
//! ## Features
//!
//! - Type-safe frame codec with checksum validation
//! - One async method per device command, strict request/response pairing
//! - Explicit, unit-testable enrollment state machine
//! - Stateless single-cycle identification for polling loops
//!
//! ## Quick Start
//!
//! ```no_run
//! use zfm::{AppConfig, ConsoleOperator, Device};
//!
//! #[tokio::main]
//! async fn main() -> zfm::Result<()> {
//!     let mut device = Device::serial("/dev/ttyUSB0");
//!     let mut operator = ConsoleOperator;
//!
//!     // Enrolls a finger if the module is empty, then polls for matches
//!     zfm::run(&mut device, &mut operator, &AppConfig::default()).await
//! }
//! ```

pub mod app;
pub mod device;
pub mod enroll;
pub mod error;
pub mod identify;
pub mod operator;

#[cfg(test)]
mod test_support;

// Re-exports
pub use app::{run, AppConfig};
pub use device::{Capture, Device, SearchOutcome};
pub use enroll::{EnrollConfig, EnrollError, EnrollState, EnrollStep, Enrollment};
pub use error::{Error, Result};
pub use identify::{identify_once, IdentifyOutcome};
pub use operator::{ConsoleOperator, Operator, WorkflowEvent};

// Re-export types
pub use zfm_core::{CharBuffer, Instruction, Packet, PacketKind, StatusCode};
pub use zfm_types::{MatchCandidate, SlotId};
