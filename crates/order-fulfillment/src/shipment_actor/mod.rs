//! # Shipment Actor
//!
//! Keyed by shipment id. CreateShipment assigns the tracking number and delivery estimate
//! exactly once; later calls return the same receipt.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::config::ShipmentConfig;
use crate::model::Shipment;
use crate::persistence::SharedGateway;
use durable_actor::{ResourceActor, ResourceClient, Substrate};

#[derive(Clone)]
pub struct ShipmentContext {
    pub gateway: SharedGateway,
    pub settings: ShipmentConfig,
}

/// Creates a new Shipment actor and its client.
pub fn new(buffer_size: usize, substrate: Substrate) -> (ResourceActor<Shipment>, ResourceClient<Shipment>) {
    ResourceActor::new(buffer_size, substrate)
}
