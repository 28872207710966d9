// Normalized shipment snapshot: the value every fetch produces and every view consumes.

use std::fmt;

/// Normalized shipment status. Anything outside the known set is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipmentStatus {
    Delivered,
    InTransit,
    AtWarehouse,
    DeliveryAttemptFailed,
    Unknown,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 5] = [
        Self::Delivered,
        Self::InTransit,
        Self::AtWarehouse,
        Self::DeliveryAttemptFailed,
        Self::Unknown,
    ];

    /// Map a wire value onto the enum. Exact match only; the upstream
    /// service already normalizes.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "DELIVERED" => Self::Delivered,
            "IN_TRANSIT" => Self::InTransit,
            "AT_WAREHOUSE" => Self::AtWarehouse,
            "DELIVERY_ATTEMPT_FAILED" => Self::DeliveryAttemptFailed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "DELIVERED",
            Self::InTransit => "IN_TRANSIT",
            Self::AtWarehouse => "AT_WAREHOUSE",
            Self::DeliveryAttemptFailed => "DELIVERY_ATTEMPT_FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Display descriptor for this status.
    pub fn style(&self) -> StatusStyle {
        match self {
            Self::Delivered => StatusStyle {
                label: "Delivered",
                tone: StatusTone::Positive,
            },
            Self::InTransit => StatusStyle {
                label: "In transit",
                tone: StatusTone::Progress,
            },
            Self::AtWarehouse => StatusStyle {
                label: "At warehouse",
                tone: StatusTone::Info,
            },
            Self::DeliveryAttemptFailed => StatusStyle {
                label: "Delivery attempt failed",
                tone: StatusTone::Critical,
            },
            Self::Unknown => StatusStyle {
                label: "Unknown",
                tone: StatusTone::Neutral,
            },
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual weight a view should give a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Positive,
    Progress,
    Info,
    Critical,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub label: &'static str,
    pub tone: StatusTone,
}

/// Present only when both coordinates were finite numbers on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude.is_finite() && longitude.is_finite() {
            Some(Self {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }
}

/// One point-in-time view of a shipment, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentSnapshot {
    pub tracking_id: String,
    pub normalized_status: ShipmentStatus,
    pub friendly_status: String,
    pub carrier_name: Option<String>,
    /// Seconds since the epoch, exactly as received. `None` when the wire
    /// value was missing or not a number.
    pub last_update: Option<f64>,
    pub location: Option<Location>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl ShipmentSnapshot {
    /// Minimal snapshot; mostly useful for fakes and tests.
    pub fn new(tracking_id: impl Into<String>, status: ShipmentStatus) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            normalized_status: status,
            friendly_status: status.style().label.to_string(),
            carrier_name: None,
            last_update: None,
            location: None,
            origin: None,
            destination: None,
        }
    }
}

/// Trim and uppercase a user-typed tracking id. `None` if nothing is left.
pub fn normalize_tracking_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_uppercase())
    }
}
