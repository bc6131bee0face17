//! Error types for the merchant inventory actor.

use crate::error::ErrorKind;
use crate::model::ItemId;
use durable_actor::StepError;
use thiserror::Error;

/// Errors that can occur during catalog and stock operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InventoryError {
    /// Missing or malformed input.
    #[error("Invalid item: {0}")]
    Validation(String),

    /// The requested item is not in the merchant's catalog.
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// The requested quantity exceeds the available stock.
    #[error("Insufficient stock for {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },

    /// A required catalog write could not be persisted.
    #[error("Inventory database error: {0}")]
    Persistence(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::Validation(_) | InventoryError::InsufficientStock { .. } => ErrorKind::Validation,
            InventoryError::NotFound(_) => ErrorKind::NotFound,
            InventoryError::Persistence(_) => ErrorKind::Persistence,
            InventoryError::ActorCommunicationError(_) => ErrorKind::Communication,
        }
    }
}

impl From<String> for InventoryError {
    fn from(msg: String) -> Self {
        InventoryError::ActorCommunicationError(msg)
    }
}

impl From<StepError> for InventoryError {
    fn from(e: StepError) -> Self {
        InventoryError::Persistence(e.to_string())
    }
}
