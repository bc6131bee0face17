//! Actions for the Shipment actor.

use crate::model::{OrderId, ShipmentReceipt, ShipmentStatus, ShippingMethod, TrackingInfo};

#[derive(Debug, Clone)]
pub enum ShipmentAction {
    /// Creates the shipment once. `method: None` uses the configured carrier and service.
    CreateShipment {
        order_id: OrderId,
        method: Option<ShippingMethod>,
    },
    /// Moves the shipment forward and appends a tracking event.
    UpdateShipmentStatus { status: ShipmentStatus, location: String },
}

/// Results from ShipmentActions - variants match 1:1 with ShipmentAction
#[derive(Debug, Clone, PartialEq)]
pub enum ShipmentActionResult {
    CreateShipment(ShipmentReceipt),
    UpdateShipmentStatus(TrackingInfo),
}

#[derive(Debug, Clone)]
pub enum ShipmentQuery {
    TrackShipment,
}

#[derive(Debug, Clone)]
pub enum ShipmentQueryResult {
    Tracking(TrackingInfo),
}
