//! Startup policy and polling loop
//!
//! Mirrors the device's intended lifecycle: handshake, check the template
//! store, enroll if it is empty, then poll for identifications until told
//! to stop. One workflow runs to completion before the next begins; the
//! device and its link belong to whichever workflow currently holds them.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use zfm_types::SlotId;

use crate::device::Device;
use crate::enroll::{EnrollConfig, Enrollment};
use crate::error::Result;
use crate::identify::{identify_once, IdentifyOutcome};
use crate::operator::{Operator, WorkflowEvent};

/// Configuration for a full run
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Slot to enroll into when the store is empty at startup
    pub enroll_slot: SlotId,

    /// Enrollment tuning
    pub enroll: EnrollConfig,

    /// Pause between idle polling cycles
    pub poll_interval: Duration,

    /// Hold time after a successful match
    pub match_hold: Duration,

    /// Hold time after a miss or a failed cycle
    pub miss_hold: Duration,

    /// Bound on identification cycles; `None` polls until the process
    /// is stopped
    pub max_cycles: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enroll_slot: SlotId(1),
            enroll: EnrollConfig::default(),
            poll_interval: Duration::from_millis(50),
            match_hold: Duration::from_secs(2),
            miss_hold: Duration::from_millis(500),
            max_cycles: None,
        }
    }
}

/// Connect, enroll if the store is empty, then poll for identifications
///
/// Fatal errors: a failed handshake (no usable link) and a failed
/// enrollment; identification never starts after either. Errors inside an
/// identification cycle are reported and the loop moves on to the next
/// cycle; each cycle stands alone.
pub async fn run(
    device: &mut Device,
    operator: &mut dyn Operator,
    config: &AppConfig,
) -> Result<()> {
    device.connect().await?;

    let count = device.template_count().await?;
    operator.notify(&WorkflowEvent::TemplatesFound { count });

    if count == 0 {
        info!("No templates stored; starting enrollment");
        let mut enrollment = Enrollment::new(config.enroll_slot, config.enroll.clone());
        enrollment.run(device, operator).await?;
    } else {
        info!(count = count, "Templates present; skipping enrollment");
    }

    let mut cycles = 0u64;
    loop {
        if let Some(max) = config.max_cycles {
            if cycles >= max {
                return Ok(());
            }
        }
        cycles += 1;

        match identify_once(device).await {
            Ok(IdentifyOutcome::Match(candidate)) => {
                operator.notify(&WorkflowEvent::MatchFound { candidate });
                sleep(config.match_hold).await;
            }
            Ok(IdentifyOutcome::NotFound) => {
                operator.notify(&WorkflowEvent::NoMatch);
                sleep(config.miss_hold).await;
            }
            Ok(IdentifyOutcome::NoFinger) => {
                sleep(config.poll_interval).await;
            }
            Err(err) => {
                warn!(error = %err, "Identification cycle failed");
                sleep(config.miss_hold).await;
            }
        }
    }
}
