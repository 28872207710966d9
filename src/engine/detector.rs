// Status-change detection. All state lives on the session it is handed.

use std::fmt;

use tracing::{debug, info};

use super::session::PollingSession;
use crate::shipment::{ShipmentSnapshot, ShipmentStatus};

/// A reportable status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub tracking_id: String,
    pub previous_status: ShipmentStatus,
    pub new_status: ShipmentStatus,
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "shipment {} changed state: {} -> {}",
            self.tracking_id, self.previous_status, self.new_status
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Compare `snapshot` against the session baseline.
    ///
    /// The first observation only records the baseline. Later observations
    /// emit an event when the status differs, `Unknown` included, and move the
    /// baseline before returning so each transition is reported once.
    pub fn observe(
        &self,
        session: &mut PollingSession,
        snapshot: &ShipmentSnapshot,
    ) -> Option<ChangeEvent> {
        let new_status = snapshot.normalized_status;
        match session.last_known_status.replace(new_status) {
            None => {
                debug!(
                    "baseline recorded session={} id={} status={}",
                    session.token, session.tracking_id, new_status
                );
                None
            }
            Some(previous) if previous != new_status => {
                info!(
                    "status change session={} id={} {} -> {}",
                    session.token, session.tracking_id, previous, new_status
                );
                Some(ChangeEvent {
                    tracking_id: session.tracking_id.clone(),
                    previous_status: previous,
                    new_status,
                })
            }
            Some(_) => None,
        }
    }
}
