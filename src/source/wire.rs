// Wire schema for the tracking endpoint: JSON bodies in, typed snapshots out.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::shipment::{Location, ShipmentSnapshot, ShipmentStatus};

/// Raw 200 body. Every field is kept untyped so a single bad field degrades
/// to its default instead of failing the whole snapshot.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireShipment {
    tracking_id: Value,
    normalized_status: Value,
    friendly_status: Value,
    carrier_name: Value,
    last_update: Value,
    current_location: Value,
    origin: Value,
    destination: Value,
}

impl WireShipment {
    fn into_snapshot(self, requested_id: &str) -> ShipmentSnapshot {
        let tracking_id = match non_empty_string(self.tracking_id) {
            Some(id) => {
                if id != requested_id {
                    debug!("tracking id mismatch requested={} returned={}", requested_id, id);
                }
                id
            }
            None => requested_id.to_string(),
        };

        let normalized_status = match &self.normalized_status {
            Value::String(s) => ShipmentStatus::from_wire(s),
            _ => ShipmentStatus::Unknown,
        };

        ShipmentSnapshot {
            tracking_id,
            normalized_status,
            friendly_status: string(self.friendly_status).unwrap_or_default(),
            carrier_name: string(self.carrier_name),
            last_update: self.last_update.as_f64(),
            location: location(&self.current_location),
            origin: string(self.origin),
            destination: string(self.destination),
        }
    }
}

fn string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn non_empty_string(value: Value) -> Option<String> {
    string(value).filter(|s| !s.trim().is_empty())
}

fn location(value: &Value) -> Option<Location> {
    let lat = value.get("latitude")?.as_f64()?;
    let lng = value.get("longitude")?.as_f64()?;
    Location::new(lat, lng)
}

/// Parse a success body. Only a body that is not a JSON object is an error.
pub fn parse_snapshot(body: &[u8], requested_id: &str) -> Result<ShipmentSnapshot, FetchError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        warn!("tracking response for {} is not JSON: {}", requested_id, e);
        FetchError::unparseable(format!("response body is not valid JSON: {}", e))
    })?;

    if !value.is_object() {
        return Err(FetchError::unparseable(
            "response body is not a JSON object".to_string(),
        ));
    }

    let wire: WireShipment = serde_json::from_value(value)
        .map_err(|e| FetchError::unparseable(format!("response body has the wrong shape: {}", e)))?;
    Ok(wire.into_snapshot(requested_id))
}

/// Pull the `detail` string out of an error body, if there is one.
pub fn parse_error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        _ => None,
    }
}
