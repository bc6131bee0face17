//! Error types for the order workflow.

use crate::cart_actor::CartError;
use crate::error::ErrorKind;
use crate::inventory_actor::InventoryError;
use crate::model::{ItemId, OrderId, OrderStatus};
use crate::payment_actor::PaymentError;
use crate::shipment_actor::ShipmentError;
use durable_actor::{FrameworkError, StepError};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Invalid order request: {0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Insufficient stock for {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },

    /// A manual transition was requested from an illegal predecessor state.
    #[error("Order {order_id} is {from}, cannot move to {to}")]
    StateConflict {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// A required order write failed.
    #[error("Order database error: {0}")]
    Persistence(String),

    /// Another actor rejected a call the workflow depends on.
    #[error("{service} call failed: {message}")]
    Dependency {
        service: &'static str,
        kind: ErrorKind,
        message: String,
    },

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::Validation(_) | OrderError::InsufficientStock { .. } => ErrorKind::Validation,
            OrderError::NotFound(_) | OrderError::ItemNotFound(_) => ErrorKind::NotFound,
            OrderError::StateConflict { .. } => ErrorKind::StateConflict,
            OrderError::Persistence(_) => ErrorKind::Persistence,
            OrderError::Dependency { kind, .. } => *kind,
            OrderError::ActorCommunicationError(_) => ErrorKind::Communication,
        }
    }
}

impl From<String> for OrderError {
    fn from(msg: String) -> Self {
        OrderError::ActorCommunicationError(msg)
    }
}

impl From<StepError> for OrderError {
    fn from(e: StepError) -> Self {
        match e {
            StepError::Journal { .. } => OrderError::ActorCommunicationError(e.to_string()),
            other => OrderError::Persistence(other.to_string()),
        }
    }
}

impl From<FrameworkError> for OrderError {
    fn from(e: FrameworkError) -> Self {
        OrderError::ActorCommunicationError(e.to_string())
    }
}

impl From<InventoryError> for OrderError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::Validation(msg) => OrderError::Validation(msg),
            InventoryError::NotFound(item_id) => OrderError::ItemNotFound(item_id),
            InventoryError::InsufficientStock {
                item_id,
                requested,
                available,
            } => OrderError::InsufficientStock {
                item_id,
                requested,
                available,
            },
            other => OrderError::Dependency {
                service: "inventory",
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }
}

impl From<PaymentError> for OrderError {
    fn from(e: PaymentError) -> Self {
        OrderError::Dependency {
            service: "payment",
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<ShipmentError> for OrderError {
    fn from(e: ShipmentError) -> Self {
        OrderError::Dependency {
            service: "shipment",
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<CartError> for OrderError {
    fn from(e: CartError) -> Self {
        OrderError::Dependency {
            service: "cart",
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}
