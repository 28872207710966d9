// Outward-facing collaborators the controller drives. Neither has a lifecycle
// of its own; both may be called from any runtime worker.
//
// `render` and `notify` run while the controller holds its state lock, so an
// implementation must not call back into the controller.

use crate::error::FetchError;
use crate::shipment::ShipmentSnapshot;

/// Paints a snapshot. Receives `last_update` and `location` exactly as fetched.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, snapshot: &ShipmentSnapshot);

    /// Polling stopped because of `error`.
    fn show_error(&self, _error: &FetchError) {}
}

/// Fire-and-forget user notification for a status change.
pub trait NotificationEmitter: Send + Sync {
    fn notify(&self, message: &str);
}
