//! Error types for the Cart actor.

use crate::error::ErrorKind;
use crate::inventory_actor::InventoryError;
use crate::model::{ItemId, MerchantId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    #[error("Invalid cart request: {0}")]
    Validation(String),

    /// A cart holds items of one merchant only.
    #[error("Cart belongs to merchant {cart}, cannot add items from {requested}")]
    MerchantMismatch { cart: MerchantId, requested: MerchantId },

    #[error("Insufficient stock for {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },

    /// The item is neither in the catalog nor (for updates) in the cart.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl CartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::Validation(_) | CartError::MerchantMismatch { .. } | CartError::InsufficientStock { .. } => {
                ErrorKind::Validation
            }
            CartError::ItemNotFound(_) => ErrorKind::NotFound,
            CartError::ActorCommunicationError(_) => ErrorKind::Communication,
        }
    }
}

impl From<String> for CartError {
    fn from(msg: String) -> Self {
        CartError::ActorCommunicationError(msg)
    }
}

impl From<InventoryError> for CartError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::Validation(msg) => CartError::Validation(msg),
            InventoryError::NotFound(item_id) => CartError::ItemNotFound(item_id),
            InventoryError::InsufficientStock {
                item_id,
                requested,
                available,
            } => CartError::InsufficientStock {
                item_id,
                requested,
                available,
            },
            other => CartError::ActorCommunicationError(other.to_string()),
        }
    }
}
