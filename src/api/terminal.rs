// Terminal views for the `trackit` binary.

use chrono::{DateTime, Local};
use tracing::info;

use super::observers::{NotificationEmitter, ViewRenderer};
use crate::error::FetchError;
use crate::shipment::{Location, ShipmentSnapshot, StatusTone};

pub const DATE_UNAVAILABLE: &str = "date unavailable";

/// `dd/mm/YYYY:HH:MM:SS` in local time, or [`DATE_UNAVAILABLE`].
pub fn format_last_update(epoch_secs: Option<f64>) -> String {
    let Some(secs) = epoch_secs.filter(|s| s.is_finite()) else {
        return DATE_UNAVAILABLE.to_string();
    };
    if secs.abs() > i64::MAX as f64 {
        return DATE_UNAVAILABLE.to_string();
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    match DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%d/%m/%Y:%H:%M:%S")
            .to_string(),
        None => DATE_UNAVAILABLE.to_string(),
    }
}

pub fn format_location(location: Option<&Location>) -> String {
    match location {
        Some(loc) => format!("Lat: {:.4}, Lng: {:.4}", loc.latitude, loc.longitude),
        None => "location unavailable".to_string(),
    }
}

fn tone_marker(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Positive => "[ok]",
        StatusTone::Progress => "[>>]",
        StatusTone::Info => "[..]",
        StatusTone::Critical => "[!!]",
        StatusTone::Neutral => "[??]",
    }
}

/// Multi-line text block for one snapshot.
pub fn format_snapshot(snapshot: &ShipmentSnapshot) -> String {
    let style = snapshot.normalized_status.style();
    let mut lines = vec![
        format!("ID: {}", snapshot.tracking_id),
        format!(
            "{} {} ({})",
            tone_marker(style.tone),
            snapshot.normalized_status,
            style.label
        ),
    ];
    if !snapshot.friendly_status.is_empty() {
        lines.push(format!("  {}", snapshot.friendly_status));
    }
    lines.push(format!(
        "  carrier: {}",
        snapshot.carrier_name.as_deref().unwrap_or("-")
    ));
    if snapshot.origin.is_some() || snapshot.destination.is_some() {
        lines.push(format!(
            "  route: {} -> {}",
            snapshot.origin.as_deref().unwrap_or("?"),
            snapshot.destination.as_deref().unwrap_or("?")
        ));
    }
    lines.push(format!(
        "  last update: {}",
        format_last_update(snapshot.last_update)
    ));
    lines.push(format!(
        "  location: {}",
        format_location(snapshot.location.as_ref())
    ));
    lines.join("\n")
}

#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl ViewRenderer for TerminalRenderer {
    fn render(&self, snapshot: &ShipmentSnapshot) {
        println!("{}\n", format_snapshot(snapshot));
    }

    fn show_error(&self, error: &FetchError) {
        eprintln!("tracking stopped ({}): {}", error.kind, error.message);
    }
}

#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl NotificationEmitter for TerminalNotifier {
    fn notify(&self, message: &str) {
        info!("notification: {}", message);
        println!("*** {}", message);
    }
}
