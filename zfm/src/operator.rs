//! Operator interface
//!
//! Workflows report every state transition through an [`Operator`] so the
//! surrounding application can render prompts however it likes; the library
//! ships a plain console renderer.

use zfm_types::{MatchCandidate, SlotId};

use crate::enroll::EnrollStep;

/// A message to whoever is holding their finger on the sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// Templates found on the module at startup
    TemplatesFound { count: u16 },

    /// Place a finger to enroll into `slot`
    PlaceFinger { slot: SlotId },

    /// Still waiting for a finger (`attempt` capture attempts so far)
    AwaitingFinger { attempt: u32 },

    /// An image was captured
    ImageCaptured,

    /// The image was converted into a feature buffer
    ImageConverted { buffer: u8 },

    /// Lift the finger off the sensor
    RemoveFinger,

    /// Put the same finger back on the sensor
    PlaceSameFinger,

    /// The two samples fused into one model
    ModelCreated,

    /// Enrollment finished; the template is stored
    Enrolled { slot: SlotId },

    /// Enrollment halted at `step`
    EnrollmentFailed { step: EnrollStep },

    /// Identification matched a stored template
    MatchFound { candidate: MatchCandidate },

    /// Identification finished without a match
    NoMatch,
}

/// Sink for workflow events
pub trait Operator {
    fn notify(&mut self, event: &WorkflowEvent);
}

/// Renders events as console prompts
#[derive(Debug, Default)]
pub struct ConsoleOperator;

impl Operator for ConsoleOperator {
    fn notify(&mut self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::TemplatesFound { count } => {
                println!("{} fingerprint(s) stored on the module", count)
            }
            WorkflowEvent::PlaceFinger { slot } => {
                println!("Place a finger to enroll into {}", slot)
            }
            WorkflowEvent::AwaitingFinger { .. } => print!("."),
            WorkflowEvent::ImageCaptured => println!("Image taken"),
            WorkflowEvent::ImageConverted { buffer } => {
                println!("Image converted (buffer {})", buffer)
            }
            WorkflowEvent::RemoveFinger => println!("Remove finger"),
            WorkflowEvent::PlaceSameFinger => println!("Place the same finger again"),
            WorkflowEvent::ModelCreated => println!("Samples fused into a model"),
            WorkflowEvent::Enrolled { slot } => {
                println!("Fingerprint enrolled successfully into {}", slot)
            }
            WorkflowEvent::EnrollmentFailed { step } => {
                println!("Enrollment failed during {}", step)
            }
            WorkflowEvent::MatchFound { candidate } => println!("Match found: {}", candidate),
            WorkflowEvent::NoMatch => println!("No match found"),
        }
    }
}
