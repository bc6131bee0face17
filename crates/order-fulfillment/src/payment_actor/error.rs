//! Error types for the Payment actor.

use crate::error::ErrorKind;
use crate::model::{PaymentId, PaymentStatus};
use durable_actor::StepError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaymentError {
    #[error("Invalid payment request: {0}")]
    Validation(String),

    #[error("Payment not found: {0}")]
    NotFound(PaymentId),

    /// The operation is not allowed in the payment's current status.
    #[error("Payment {payment_id} is {status}, cannot {operation}")]
    StateConflict {
        payment_id: PaymentId,
        status: PaymentStatus,
        operation: String,
    },

    /// A required payment row could not be persisted.
    #[error("Payment database error: {0}")]
    Persistence(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Validation(_) => ErrorKind::Validation,
            PaymentError::NotFound(_) => ErrorKind::NotFound,
            PaymentError::StateConflict { .. } => ErrorKind::StateConflict,
            PaymentError::Persistence(_) => ErrorKind::Persistence,
            PaymentError::ActorCommunicationError(_) => ErrorKind::Communication,
        }
    }
}

impl From<String> for PaymentError {
    fn from(msg: String) -> Self {
        PaymentError::ActorCommunicationError(msg)
    }
}

impl From<StepError> for PaymentError {
    fn from(e: StepError) -> Self {
        match e {
            StepError::Journal { .. } => PaymentError::ActorCommunicationError(e.to_string()),
            other => PaymentError::Persistence(other.to_string()),
        }
    }
}
