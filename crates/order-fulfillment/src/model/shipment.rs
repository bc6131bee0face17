use crate::model::{OrderId, ShipmentId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub carrier: String,
    pub service_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Created,
    InTransit,
    Delivered,
}

impl ShipmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Created => "CREATED",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::Delivered => "DELIVERED",
        }
    }
}

impl Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentEvent {
    pub status: ShipmentStatus,
    pub location: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: ShipmentId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub carrier: String,
    pub service_type: String,
    /// `None` until CreateShipment succeeds.
    pub status: Option<ShipmentStatus>,
    pub current_location: String,
    pub estimated_delivery: Option<NaiveDate>,
    pub events: Vec<ShipmentEvent>,
}

/// Result of CreateShipment. Repeated calls return the same values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentReceipt {
    pub shipment_id: ShipmentId,
    pub tracking_number: String,
    pub estimated_delivery: Option<NaiveDate>,
}

/// Read-only projection returned by TrackShipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub shipment_id: ShipmentId,
    pub tracking_number: String,
    pub carrier: String,
    pub status: ShipmentStatus,
    pub current_location: String,
    pub estimated_delivery: Option<NaiveDate>,
    pub events: Vec<ShipmentEvent>,
}
