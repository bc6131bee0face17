//! # Awakeables
//!
//! Single-use continuation tokens. A suspended invocation awaits an [`Awakeable`]; anything
//! holding the [`AwakeableId`] (a webhook handler, another actor) completes it exactly once
//! through the [`Substrate`](crate::Substrate).
//!
//! Completions are remembered, so a waiter that arrives late (or a replayed invocation) still
//! receives the payload.

use crate::error::FrameworkError;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::marker::PhantomData;
use tokio::sync::oneshot;
use uuid::Uuid;

type Completion = Result<Value, String>;

/// Opaque token handed to external parties to resume a suspended invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwakeableId(String);

impl AwakeableId {
    pub(crate) fn generate() -> Self {
        Self(format!("awk_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AwakeableId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AwakeableId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for AwakeableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

enum Slot {
    Pending {
        waiter: Option<oneshot::Sender<Completion>>,
    },
    Completed(Completion),
}

#[derive(Default)]
pub struct AwakeableRegistry {
    slots: Mutex<HashMap<AwakeableId, Slot>>,
}

impl AwakeableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` if it is not known yet. Registering twice is a no-op, which is what a
    /// replayed invocation relies on.
    pub fn register(&self, id: &AwakeableId) {
        self.slots
            .lock()
            .entry(id.clone())
            .or_insert(Slot::Pending { waiter: None });
    }

    pub fn wait<T: DeserializeOwned>(&self, id: &AwakeableId) -> Result<Awakeable<T>, FrameworkError> {
        let mut slots = self.slots.lock();
        match slots.get_mut(id) {
            None => Err(FrameworkError::AwakeableNotFound(id.to_string())),
            Some(Slot::Completed(done)) => Ok(Awakeable::ready(id.clone(), done.clone())),
            Some(Slot::Pending { waiter }) => {
                let (tx, rx) = oneshot::channel();
                *waiter = Some(tx);
                Ok(Awakeable::waiting(id.clone(), rx))
            }
        }
    }

    pub fn complete(&self, id: &AwakeableId, completion: Completion) -> Result<(), FrameworkError> {
        let mut slots = self.slots.lock();
        let slot = slots
            .get_mut(id)
            .ok_or_else(|| FrameworkError::AwakeableNotFound(id.to_string()))?;
        let waiter = match slot {
            Slot::Completed(_) => return Err(FrameworkError::AwakeableAlreadyResolved(id.to_string())),
            Slot::Pending { waiter } => waiter.take(),
        };
        if let Some(tx) = waiter {
            let _ = tx.send(completion.clone());
        }
        *slot = Slot::Completed(completion);
        Ok(())
    }
}

enum Pending {
    Ready(Completion),
    Waiting(oneshot::Receiver<Completion>),
}

/// Future side of a continuation token.
pub struct Awakeable<T> {
    id: AwakeableId,
    pending: Pending,
    _payload: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Awakeable<T> {
    fn ready(id: AwakeableId, completion: Completion) -> Self {
        Self {
            id,
            pending: Pending::Ready(completion),
            _payload: PhantomData,
        }
    }

    fn waiting(id: AwakeableId, rx: oneshot::Receiver<Completion>) -> Self {
        Self {
            id,
            pending: Pending::Waiting(rx),
            _payload: PhantomData,
        }
    }

    pub fn id(&self) -> &AwakeableId {
        &self.id
    }

    /// Suspends until the token is resolved or rejected.
    pub async fn result(self) -> Result<T, FrameworkError> {
        let completion = match self.pending {
            Pending::Ready(done) => done,
            Pending::Waiting(rx) => rx.await.map_err(|_| FrameworkError::ActorDropped)?,
        };
        let value = completion.map_err(FrameworkError::AwakeableRejected)?;
        serde_json::from_value(value)
            .map_err(|e| FrameworkError::Journal(format!("awakeable {} payload: {e}", self.id)))
    }
}
