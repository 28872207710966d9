//! Shipment tracking client.
//!
//! [`engine::controller::PollingController`] looks a shipment up once, then
//! re-fetches it on a fixed period through a [`source::traits::ShipmentSource`],
//! forwarding every applied snapshot to a [`api::observers::ViewRenderer`] and
//! every status transition to a [`api::observers::NotificationEmitter`].

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod shipment;
pub mod source;
