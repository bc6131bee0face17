//! # Invocation Context
//!
//! Every action runs with an [`Invocation`]: the handle through which it reaches the durable
//! substrate. Anything non-deterministic or side-effecting that must not repeat when the
//! invocation is replayed goes through one of its journaled operations:
//!
//! | Operation | Journals | On replay |
//! |-----------|----------|-----------|
//! | [`Invocation::run`] | step result | returns the recorded result, closure not called |
//! | [`Invocation::journaled`] | call result | returns the recorded result, future not polled |
//! | [`Invocation::sleep`] | wake-up deadline | sleeps only for the remainder |
//! | [`Invocation::uuid`] | generated id | returns the same id |
//! | [`Invocation::awakeable`] | token id | re-attaches to the same token |
//! | [`Invocation::enqueue_self`] | the fact it was sent | not sent again |
//!
//! Journal positions are matched by order *and* name, so a handler that takes a different
//! path on replay fails loudly with [`StepError::Journal`] instead of reading someone else's
//! result.

use crate::awakeable::{Awakeable, AwakeableId};
use crate::entity::ActorEntity;
use crate::error::{FrameworkError, StepError};
use crate::message::Envelope;
use crate::store::InvocationId;
use crate::substrate::Substrate;
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct Invocation<T: ActorEntity> {
    id: InvocationId,
    key: T::Key,
    substrate: Substrate,
    mailbox: Option<mpsc::WeakUnboundedSender<Envelope<T>>>,
    cursor: AtomicUsize,
    checkpointed: AtomicBool,
}

impl<T: ActorEntity> Invocation<T> {
    pub(crate) fn new(
        key: T::Key,
        substrate: Substrate,
        mailbox: Option<mpsc::WeakUnboundedSender<Envelope<T>>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            substrate,
            mailbox,
            cursor: AtomicUsize::new(0),
            checkpointed: AtomicBool::new(false),
        }
    }

    /// A free-standing invocation that is not attached to any actor mailbox. Useful for
    /// driving an entity's handlers directly in unit tests.
    pub fn detached(key: T::Key, substrate: Substrate) -> Self {
        Self::new(key, substrate, None)
    }

    pub fn id(&self) -> InvocationId {
        self.id
    }

    pub fn key(&self) -> &T::Key {
        &self.key
    }

    pub fn substrate(&self) -> &Substrate {
        &self.substrate
    }

    /// Moves the journal cursor back to the start before a replay.
    pub(crate) fn rewind(&self) {
        self.cursor.store(0, Ordering::SeqCst);
    }

    pub(crate) fn was_checkpointed(&self) -> bool {
        self.checkpointed.load(Ordering::SeqCst)
    }

    fn next_index(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::SeqCst)
    }

    fn replay<V: DeserializeOwned>(&self, index: usize, name: &str) -> Result<Option<V>, StepError> {
        let Some(entry) = self.substrate.store().journal_entry(&self.id, index) else {
            return Ok(None);
        };
        if entry.name != name {
            return Err(StepError::Journal {
                step: name.to_string(),
                reason: format!("position {index} holds '{}'", entry.name),
            });
        }
        serde_json::from_value(entry.value)
            .map(Some)
            .map_err(|e| StepError::Journal {
                step: name.to_string(),
                reason: e.to_string(),
            })
    }

    fn record<V: Serialize>(&self, index: usize, name: &str, value: &V) -> Result<(), StepError> {
        let value = serde_json::to_value(value).map_err(|e| StepError::Journal {
            step: name.to_string(),
            reason: e.to_string(),
        })?;
        self.substrate.store().record(&self.id, index, name, value);
        Ok(())
    }

    /// Runs a non-idempotent step with at-least-once semantics.
    ///
    /// The closure is called again from scratch after every [`StepError::Transient`], with
    /// backoff from the substrate's step policy. Once it succeeds the result is journaled.
    pub async fn run<V, F, Fut>(&self, name: &str, mut step: F) -> Result<V, StepError>
    where
        V: Serialize + DeserializeOwned + Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<V, StepError>> + Send,
    {
        let index = self.next_index();
        if let Some(done) = self.replay(index, name)? {
            debug!(entity_type = T::KIND, key = %self.key, step = name, "Step replayed");
            return Ok(done);
        }

        let mut delays = self.substrate.step_retry().delays();
        let mut attempt = 1;
        loop {
            match step().await {
                Ok(value) => {
                    self.record(index, name, &value)?;
                    return Ok(value);
                }
                Err(StepError::Transient(reason)) => match delays.next() {
                    Some(delay) => {
                        warn!(entity_type = T::KIND, key = %self.key, step = name, attempt, %reason, "Step failed, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        return Err(StepError::Exhausted {
                            step: name.to_string(),
                            attempts: attempt,
                            last_error: reason,
                        });
                    }
                },
                Err(other) => return Err(other),
            }
        }
    }

    /// Journals the successful result of a single call (typically to another actor).
    /// Errors are not journaled; a replay makes the call again.
    pub async fn journaled<V, E, Fut>(&self, name: &str, call: Fut) -> Result<V, E>
    where
        V: Serialize + DeserializeOwned + Send,
        E: From<StepError>,
        Fut: Future<Output = Result<V, E>> + Send,
    {
        let index = self.next_index();
        if let Some(done) = self.replay(index, name)? {
            debug!(entity_type = T::KIND, key = %self.key, step = name, "Call replayed");
            return Ok(done);
        }
        let value = call.await?;
        self.record(index, name, &value)?;
        Ok(value)
    }

    /// Durable timer. A zero duration returns immediately without touching the journal.
    pub async fn sleep(&self, duration: Duration) -> Result<(), StepError> {
        if duration.is_zero() {
            return Ok(());
        }
        let index = self.next_index();
        let wake_at: DateTime<Utc> = match self.replay(index, "sleep")? {
            Some(at) => at,
            None => {
                let delta = TimeDelta::from_std(duration).map_err(|e| StepError::terminal(e.to_string()))?;
                let at = Utc::now() + delta;
                self.record(index, "sleep", &at)?;
                at
            }
        };
        let remaining = (wake_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(remaining).await;
        Ok(())
    }

    /// A random identifier that stays the same across replays.
    pub fn uuid(&self) -> Result<Uuid, StepError> {
        let index = self.next_index();
        if let Some(id) = self.replay(index, "uuid")? {
            return Ok(id);
        }
        let id = Uuid::new_v4();
        self.record(index, "uuid", &id)?;
        Ok(id)
    }

    /// Creates a continuation token and returns the future that completes when it is resolved.
    pub fn awakeable<P: DeserializeOwned>(&self) -> Result<Awakeable<P>, FrameworkError> {
        let index = self.next_index();
        let id = match self.replay::<AwakeableId>(index, "awakeable")? {
            Some(id) => id,
            None => {
                let id = AwakeableId::generate();
                self.record(index, "awakeable", &id)?;
                id
            }
        };
        self.substrate.awakeables().register(&id);
        debug!(entity_type = T::KIND, key = %self.key, awakeable = %id, "Awakeable created");
        self.substrate.awakeables().wait(&id)
    }

    /// Re-attaches to a token created by an earlier invocation.
    pub fn await_awakeable<P: DeserializeOwned>(&self, id: &AwakeableId) -> Result<Awakeable<P>, FrameworkError> {
        self.substrate.awakeables().wait(id)
    }

    pub fn resolve_awakeable<P: Serialize>(&self, id: &AwakeableId, payload: &P) -> Result<(), FrameworkError> {
        self.substrate.resolve_awakeable(id, payload)
    }

    /// Queues a one-way action on this same key, to run after the current invocation.
    pub fn enqueue_self(&self, action: T::Action) -> Result<(), FrameworkError> {
        let index = self.next_index();
        if self.replay::<bool>(index, "enqueue")?.is_some() {
            return Ok(());
        }
        let sender = self
            .mailbox
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .ok_or(FrameworkError::ActorClosed)?;
        debug!(entity_type = T::KIND, key = %self.key, ?action, "Enqueue");
        sender
            .send(Envelope::Action {
                action,
                respond_to: None,
            })
            .map_err(|_| FrameworkError::ActorClosed)?;
        self.record(index, "enqueue", &true)?;
        Ok(())
    }

    /// Publishes `state` as the committed snapshot before the invocation finishes, so shared
    /// queries can observe intermediate progress.
    pub fn checkpoint(&self, state: &T) -> Result<(), FrameworkError> {
        self.substrate
            .store()
            .save(T::KIND, &self.key.to_string(), state)?;
        self.checkpointed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl From<StepError> for FrameworkError {
    fn from(e: StepError) -> Self {
        FrameworkError::Journal(e.to_string())
    }
}
