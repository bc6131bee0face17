//! # Shipment Client
//!
//! Provides a high‑level API for interacting with the `Shipment` actor.
use crate::model::{OrderId, Shipment, ShipmentId, ShipmentReceipt, ShipmentStatus, ShippingMethod, TrackingInfo};
use crate::shipment_actor::{ShipmentAction, ShipmentActionResult, ShipmentError, ShipmentQuery, ShipmentQueryResult};
use async_trait::async_trait;
use durable_actor::{ActorClient, FrameworkError, ResourceClient};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Client for interacting with the Shipment actor.
#[derive(Clone)]
pub struct ShipmentClient {
    inner: ResourceClient<Shipment>,
}

#[async_trait]
impl ActorClient<Shipment> for ShipmentClient {
    type Error = ShipmentError;

    fn inner(&self) -> &ResourceClient<Shipment> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        ShipmentError::ActorCommunicationError(e.to_string())
    }
}

fn unexpected(response: impl Debug) -> ShipmentError {
    ShipmentError::ActorCommunicationError(format!("unexpected response: {response:?}"))
}

impl ShipmentClient {
    pub fn new(inner: ResourceClient<Shipment>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn create_shipment(
        &self,
        shipment_id: ShipmentId,
        order_id: OrderId,
        method: Option<ShippingMethod>,
    ) -> Result<ShipmentReceipt, ShipmentError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(shipment_id, ShipmentAction::CreateShipment { order_id, method })
            .await
            .map_err(Self::lift_error)?
        {
            ShipmentActionResult::CreateShipment(receipt) => Ok(receipt),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        shipment_id: ShipmentId,
        status: ShipmentStatus,
        location: String,
    ) -> Result<TrackingInfo, ShipmentError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(shipment_id, ShipmentAction::UpdateShipmentStatus { status, location })
            .await
            .map_err(Self::lift_error)?
        {
            ShipmentActionResult::UpdateShipmentStatus(info) => Ok(info),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn track_shipment(&self, shipment_id: ShipmentId) -> Result<TrackingInfo, ShipmentError> {
        debug!("Sending request");
        match self
            .inner
            .query(shipment_id, ShipmentQuery::TrackShipment)
            .await
            .map_err(Self::lift_error)?
        {
            ShipmentQueryResult::Tracking(info) => Ok(info),
        }
    }
}
