use std::fmt;

use crate::shipment::ShipmentStatus;

/// Identifies one session instance. Minted fresh per session and never reused
/// within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Bookkeeping for one shipment's polling lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingSession {
    pub token: SessionToken,
    pub tracking_id: String,
    /// `None` until the first successful fetch of this session.
    pub last_known_status: Option<ShipmentStatus>,
    /// Whether a recurring schedule is running for this session.
    pub active: bool,
}

impl PollingSession {
    pub fn new(token: SessionToken, tracking_id: impl Into<String>) -> Self {
        Self {
            token,
            tracking_id: tracking_id.into(),
            last_known_status: None,
            active: false,
        }
    }
}
