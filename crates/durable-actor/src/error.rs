//! # Framework Errors
//!
//! This module defines the common error types used throughout the actor runtime and the
//! durable execution substrate. Domain errors travel inside [`FrameworkError::EntityError`]
//! and can be recovered with [`FrameworkError::into_entity_error`].

/// Errors that can occur within the actor runtime itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
    #[error("Journal error: {0}")]
    Journal(String),
    #[error("Awakeable not found: {0}")]
    AwakeableNotFound(String),
    #[error("Awakeable already resolved: {0}")]
    AwakeableAlreadyResolved(String),
    #[error("Awakeable rejected: {0}")]
    AwakeableRejected(String),
}

impl FrameworkError {
    /// Recovers the typed domain error carried by an [`FrameworkError::EntityError`].
    ///
    /// Any other variant, or an entity error of a different type, is handed back unchanged
    /// so the caller can map it into its own communication error.
    pub fn into_entity_error<E>(self) -> Result<E, FrameworkError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            FrameworkError::EntityError(inner) => match inner.downcast::<E>() {
                Ok(typed) => Ok(*typed),
                Err(other) => Err(FrameworkError::EntityError(other)),
            },
            other => Err(other),
        }
    }
}

/// Outcome of a failed durable step.
///
/// A step closure returns [`StepError::Transient`] to ask the substrate for another attempt and
/// [`StepError::Terminal`] to stop immediately. The substrate itself produces
/// [`StepError::Exhausted`] once the retry policy gives up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("terminal failure: {0}")]
    Terminal(String),
    #[error("step '{step}' failed after {attempts} attempts: {last_error}")]
    Exhausted {
        step: String,
        attempts: u32,
        last_error: String,
    },
    #[error("journal entry for step '{step}' could not be replayed: {reason}")]
    Journal { step: String, reason: String },
}

impl StepError {
    pub fn transient(msg: impl Into<String>) -> Self {
        StepError::Transient(msg.into())
    }

    pub fn terminal(msg: impl Into<String>) -> Self {
        StepError::Terminal(msg.into())
    }

    /// True when retries ran out rather than the step declaring a terminal failure.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, StepError::Exhausted { .. })
    }
}
