//! Error types for the Shipment actor.

use crate::error::ErrorKind;
use crate::model::{ShipmentId, ShipmentStatus};
use durable_actor::StepError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShipmentError {
    #[error("Invalid shipment request: {0}")]
    Validation(String),

    #[error("Shipment not found: {0}")]
    NotFound(ShipmentId),

    #[error("Shipment {shipment_id} cannot move from {from} to {to}")]
    StateConflict {
        shipment_id: ShipmentId,
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    #[error("Shipment database error: {0}")]
    Persistence(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl ShipmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShipmentError::Validation(_) => ErrorKind::Validation,
            ShipmentError::NotFound(_) => ErrorKind::NotFound,
            ShipmentError::StateConflict { .. } => ErrorKind::StateConflict,
            ShipmentError::Persistence(_) => ErrorKind::Persistence,
            ShipmentError::ActorCommunicationError(_) => ErrorKind::Communication,
        }
    }
}

impl From<String> for ShipmentError {
    fn from(msg: String) -> Self {
        ShipmentError::ActorCommunicationError(msg)
    }
}

impl From<StepError> for ShipmentError {
    fn from(e: StepError) -> Self {
        match e {
            StepError::Journal { .. } => ShipmentError::ActorCommunicationError(e.to_string()),
            other => ShipmentError::Persistence(other.to_string()),
        }
    }
}
