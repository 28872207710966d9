use async_trait::async_trait;

use crate::error::FetchError;
use crate::shipment::ShipmentSnapshot;

/// One request/response cycle against a tracking backend.
///
/// Implementations classify every failure into a [`FetchError`] and never
/// touch shared state.
#[async_trait]
pub trait ShipmentSource: Send + Sync {
    async fn fetch(&self, tracking_id: &str) -> Result<ShipmentSnapshot, FetchError>;
}
