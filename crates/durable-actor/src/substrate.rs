//! # Durable Execution Substrate
//!
//! Shared runtime services every `ResourceActor` is started with: the durable store
//! (snapshots and journals), the awakeable registry and the retry policies. Cloning a
//! `Substrate` is cheap and all clones see the same state.

use crate::awakeable::{AwakeableId, AwakeableRegistry};
use crate::error::FrameworkError;
use crate::retry::RetryPolicy;
use crate::store::DurableStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

struct Inner {
    store: DurableStore,
    awakeables: AwakeableRegistry,
    step_retry: RetryPolicy,
    invocation_retry: RetryPolicy,
}

#[derive(Clone)]
pub struct Substrate {
    inner: Arc<Inner>,
}

impl Default for Substrate {
    fn default() -> Self {
        Self::new()
    }
}

impl Substrate {
    pub fn new() -> Self {
        Self::with_policies(RetryPolicy::default(), RetryPolicy::immediate(3))
    }

    /// `step_retry` bounds `Invocation::run`; `invocation_retry` bounds replays of an action
    /// that failed with a transient error.
    pub fn with_policies(step_retry: RetryPolicy, invocation_retry: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: DurableStore::new(),
                awakeables: AwakeableRegistry::new(),
                step_retry,
                invocation_retry,
            }),
        }
    }

    pub fn store(&self) -> &DurableStore {
        &self.inner.store
    }

    pub fn awakeables(&self) -> &AwakeableRegistry {
        &self.inner.awakeables
    }

    pub fn step_retry(&self) -> &RetryPolicy {
        &self.inner.step_retry
    }

    pub fn invocation_retry(&self) -> &RetryPolicy {
        &self.inner.invocation_retry
    }

    /// Completes a continuation token with `payload`, waking the invocation suspended on it.
    pub fn resolve_awakeable<P: Serialize>(&self, id: &AwakeableId, payload: &P) -> Result<(), FrameworkError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| FrameworkError::Journal(format!("awakeable {id} payload: {e}")))?;
        match self.inner.awakeables.complete(id, Ok(value)) {
            Ok(()) => {
                info!(awakeable = %id, "Awakeable resolved");
                Ok(())
            }
            Err(e) => {
                warn!(awakeable = %id, error = %e, "Awakeable resolution refused");
                Err(e)
            }
        }
    }

    /// Completes a continuation token with a failure; the waiter observes
    /// `FrameworkError::AwakeableRejected`.
    pub fn reject_awakeable(&self, id: &AwakeableId, reason: impl Into<String>) -> Result<(), FrameworkError> {
        let reason = reason.into();
        self.inner.awakeables.complete(id, Err(reason.clone()))?;
        info!(awakeable = %id, %reason, "Awakeable rejected");
        Ok(())
    }
}
