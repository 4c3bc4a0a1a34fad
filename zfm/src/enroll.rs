//! Two-capture enrollment workflow
//!
//! The original device-interaction sequence is a chain of nested status
//! checks; here it is an explicit state machine. [`Enrollment::step`]
//! performs exactly one transition so every edge can be unit-tested against
//! a scripted transport; [`Enrollment::run`] drives to a terminal state.
//!
//! Ordering is strict: the model is only stored after both captures
//! converted and fusion succeeded. Any unexpected status halts the
//! enrollment with the failing step and the raw device code; nothing is
//! silently retried past a conversion, fusion, or storage failure. The only
//! retried condition is `NoFinger` during a capture, and that retry is
//! bounded by [`EnrollConfig::max_capture_attempts`].

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use zfm_core::CharBuffer;
use zfm_types::SlotId;

use crate::device::{Capture, Device};
use crate::error::Error;
use crate::operator::{Operator, WorkflowEvent};

/// The step at which an enrollment failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollStep {
    FirstCapture,
    FirstConversion,
    SecondCapture,
    SecondConversion,
    ModelCreation,
    Storage,
}

impl fmt::Display for EnrollStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FirstCapture => "first capture",
            Self::FirstConversion => "first conversion",
            Self::SecondCapture => "second capture",
            Self::SecondConversion => "second conversion",
            Self::ModelCreation => "model creation",
            Self::Storage => "storage",
        };
        write!(f, "{}", name)
    }
}

/// Terminal failure of one enrollment, carrying the step that halted it
/// and the underlying device error (with the raw status code)
#[derive(Debug, thiserror::Error)]
#[error("{step}: {source}")]
pub struct EnrollError {
    pub step: EnrollStep,
    #[source]
    pub source: Error,
}

/// Enrollment state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollState {
    AwaitFirstCapture,
    ConvertFirst,
    AwaitRemoval,
    AwaitSecondCapture,
    ConvertSecond,
    CreateModel,
    StoreModel,
    Done,
    Failed(EnrollStep),
}

impl EnrollState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

/// Tunable knobs for the enrollment workflow
#[derive(Debug, Clone)]
pub struct EnrollConfig {
    /// Capture attempts allowed per finger placement before giving up.
    /// The original sketch polled forever; an indefinite wait is a
    /// liveness hazard, so the budget is explicit here.
    pub max_capture_attempts: u32,

    /// Pause between capture attempts while no finger is present
    pub retry_delay: Duration,

    /// Settle time after the first conversion, letting the finger lift
    /// before the second placement
    pub settle_delay: Duration,
}

impl Default for EnrollConfig {
    fn default() -> Self {
        Self {
            max_capture_attempts: 100,
            retry_delay: Duration::from_millis(50),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// One enrollment of one finger into one slot
pub struct Enrollment {
    slot: SlotId,
    config: EnrollConfig,
    state: EnrollState,
    attempts: u32,
}

impl Enrollment {
    pub fn new(slot: SlotId, config: EnrollConfig) -> Self {
        Self {
            slot,
            config,
            state: EnrollState::AwaitFirstCapture,
            attempts: 0,
        }
    }

    pub fn state(&self) -> EnrollState {
        self.state
    }

    /// Drive the state machine to a terminal state
    pub async fn run(
        &mut self,
        device: &mut Device,
        operator: &mut dyn Operator,
    ) -> Result<(), EnrollError> {
        info!(slot = self.slot.as_u16(), "Starting enrollment");
        operator.notify(&WorkflowEvent::PlaceFinger { slot: self.slot });

        while !self.state.is_terminal() {
            if let Err(err) = self.step(device, operator).await {
                self.state = EnrollState::Failed(err.step);
                warn!(step = %err.step, error = %err.source, "Enrollment failed");
                operator.notify(&WorkflowEvent::EnrollmentFailed { step: err.step });
                return Err(err);
            }
        }

        info!(slot = self.slot.as_u16(), "Enrollment complete");
        Ok(())
    }

    /// Perform one state transition
    ///
    /// Capture states consume one capture attempt per call and stay put on
    /// `NoFinger`; every other state issues exactly one device command.
    pub async fn step(
        &mut self,
        device: &mut Device,
        operator: &mut dyn Operator,
    ) -> Result<(), EnrollError> {
        debug!(state = ?self.state, "Enrollment step");

        match self.state {
            EnrollState::AwaitFirstCapture => {
                if self
                    .try_capture(device, operator, EnrollStep::FirstCapture)
                    .await?
                {
                    self.state = EnrollState::ConvertFirst;
                }
            }
            EnrollState::ConvertFirst => {
                self.convert(device, operator, CharBuffer::One, EnrollStep::FirstConversion)
                    .await?;
                self.state = EnrollState::AwaitRemoval;
            }
            EnrollState::AwaitRemoval => {
                operator.notify(&WorkflowEvent::RemoveFinger);
                sleep(self.config.settle_delay).await;
                operator.notify(&WorkflowEvent::PlaceSameFinger);
                self.attempts = 0;
                self.state = EnrollState::AwaitSecondCapture;
            }
            EnrollState::AwaitSecondCapture => {
                if self
                    .try_capture(device, operator, EnrollStep::SecondCapture)
                    .await?
                {
                    self.state = EnrollState::ConvertSecond;
                }
            }
            EnrollState::ConvertSecond => {
                self.convert(device, operator, CharBuffer::Two, EnrollStep::SecondConversion)
                    .await?;
                self.state = EnrollState::CreateModel;
            }
            EnrollState::CreateModel => {
                device.create_model().await.map_err(|source| EnrollError {
                    step: EnrollStep::ModelCreation,
                    source,
                })?;
                operator.notify(&WorkflowEvent::ModelCreated);
                self.state = EnrollState::StoreModel;
            }
            EnrollState::StoreModel => {
                let slot = self.slot;
                device.store_model(slot).await.map_err(|source| EnrollError {
                    step: EnrollStep::Storage,
                    source,
                })?;
                operator.notify(&WorkflowEvent::Enrolled { slot });
                self.state = EnrollState::Done;
            }
            EnrollState::Done | EnrollState::Failed(_) => {}
        }

        Ok(())
    }

    /// One capture attempt; `Ok(true)` once an image is in the buffer
    async fn try_capture(
        &mut self,
        device: &mut Device,
        operator: &mut dyn Operator,
        step: EnrollStep,
    ) -> Result<bool, EnrollError> {
        match device.capture_image().await {
            Ok(Capture::ImageReady) => {
                operator.notify(&WorkflowEvent::ImageCaptured);
                Ok(true)
            }
            Ok(Capture::NoFinger) => {
                self.attempts += 1;
                if self.attempts >= self.config.max_capture_attempts {
                    return Err(EnrollError {
                        step,
                        source: Error::CaptureTimeout {
                            attempts: self.attempts,
                        },
                    });
                }
                operator.notify(&WorkflowEvent::AwaitingFinger {
                    attempt: self.attempts,
                });
                sleep(self.config.retry_delay).await;
                Ok(false)
            }
            Err(source) => Err(EnrollError { step, source }),
        }
    }

    async fn convert(
        &mut self,
        device: &mut Device,
        operator: &mut dyn Operator,
        buffer: CharBuffer,
        step: EnrollStep,
    ) -> Result<(), EnrollError> {
        device
            .convert_image(buffer)
            .await
            .map_err(|source| EnrollError { step, source })?;
        operator.notify(&WorkflowEvent::ImageConverted {
            buffer: buffer as u8,
        });
        Ok(())
    }
}
