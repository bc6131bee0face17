//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the server side of a keyed actor type. One
//! router task per actor type receives every request and hands it to the per-key instance
//! that owns the key, spawning the instance on first use.
//!
//! **Concurrency Model**:
//! - Each key has its own instance task with an ordered mailbox, so actions on one key run
//!   strictly one at a time in submission order without any lock around the state.
//! - Instances of different keys run in parallel; an instance suspended on another actor,
//!   a timer or an awakeable never holds up other keys.
//! - Queries run on their own task against the committed snapshot.

use crate::client::ResourceClient;
use crate::context::Invocation;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{Envelope, ResourceRequest, Response};
use crate::substrate::Substrate;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// ## ResourceActor
///
/// The `ResourceActor<T>` owns the mailbox of every live key of entity type `T` and the
/// handles of their instance tasks.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `ResourceActor::new()` to get the `actor` (server) and `client` (interface).
/// 2.  **Wire**: Pass dependencies (other clients) into `actor.run(context)`.
/// 3.  **Run**: Spawn the actor's run loop in a background task.
///
/// # Instance lifecycle
///
/// * **Activate**: the first action on a key (or the first after an eviction) loads the
///   committed snapshot from the durable store, or `T::default()`, and calls `on_activate`.
/// * **Invoke**: `handle_action` runs on a working copy. On success, and on a non-transient
///   error, the copy becomes the new state and is committed. A transient error discards the
///   copy and replays the invocation with the same journal, up to the substrate's
///   invocation retry policy.
/// * **Evict**: the in-memory state is dropped; the next action activates again.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    substrate: Substrate,
    instances: HashMap<T::Key, mpsc::UnboundedSender<Envelope<T>>>,
    shutdown_grace: Duration,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the router channel. Per-key mailboxes are unbounded
    /// so a busy key never stalls the router.
    pub fn new(buffer_size: usize, substrate: Substrate) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            substrate,
            instances: HashMap::new(),
            shutdown_grace: Duration::from_secs(5),
        };
        (actor, ResourceClient::new(sender))
    }

    /// How long shutdown waits for in-flight invocations before abandoning them. Abandoned
    /// invocations keep their last checkpoint.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Runs the router loop until every client is dropped.
    ///
    /// # Context Injection
    /// The `context` argument is cloned into every instance and query task.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = T::KIND;
        info!(entity_type, "Actor started");
        let mut workers = JoinSet::new();

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Get { key, respond_to } => {
                    let snapshot = self.substrate.store().load::<T>(T::KIND, &key.to_string());
                    debug!(entity_type, %key, found = matches!(snapshot, Ok(Some(_))), "Get");
                    let _ = respond_to.send(snapshot);
                }
                ResourceRequest::Action {
                    key,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %key, ?action, "Action");
                    self.dispatch(key, Envelope::Action { action, respond_to }, &context, &mut workers);
                }
                ResourceRequest::Query {
                    key,
                    query,
                    respond_to,
                } => {
                    debug!(entity_type, %key, ?query, "Query");
                    let substrate = self.substrate.clone();
                    let ctx = context.clone();
                    workers.spawn(async move {
                        let result = run_query::<T>(&substrate, &key, query, &ctx).await;
                        if let Err(e) = &result {
                            debug!(entity_type, %key, error = %e, "Query failed");
                        }
                        let _ = respond_to.send(result);
                    });
                }
                ResourceRequest::Evict { key, respond_to } => {
                    if self.instances.contains_key(&key) {
                        self.dispatch(key, Envelope::Evict { respond_to }, &context, &mut workers);
                    } else {
                        let _ = respond_to.send(Ok(()));
                    }
                }
            }

            while let Some(finished) = workers.try_join_next() {
                if let Err(e) = finished {
                    error!(entity_type, error = %e, "Worker task failed");
                }
            }
        }

        let keys = self.instances.len();
        self.instances.clear();
        let drained = tokio::time::timeout(self.shutdown_grace, async {
            while let Some(finished) = workers.join_next().await {
                if let Err(e) = finished {
                    error!(entity_type, error = %e, "Worker task failed");
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(entity_type, pending = workers.len(), "Abandoning suspended invocations");
            workers.shutdown().await;
        }
        info!(entity_type, keys, "Shutdown");
    }

    fn dispatch(
        &mut self,
        key: T::Key,
        envelope: Envelope<T>,
        context: &T::Context,
        workers: &mut JoinSet<()>,
    ) {
        let substrate = &self.substrate;
        let mailbox = self.instances.entry(key.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            workers.spawn(run_instance::<T>(
                key.clone(),
                rx,
                tx.downgrade(),
                substrate.clone(),
                context.clone(),
            ));
            tx
        });

        if let Err(mpsc::error::SendError(envelope)) = mailbox.send(envelope) {
            warn!(entity_type = T::KIND, %key, "Instance stopped; request dropped");
            self.instances.remove(&key);
            match envelope {
                Envelope::Action {
                    respond_to: Some(respond_to),
                    ..
                } => {
                    let _ = respond_to.send(Err(FrameworkError::ActorDropped));
                }
                Envelope::Action { respond_to: None, .. } => {}
                Envelope::Evict { respond_to } => {
                    let _ = respond_to.send(Err(FrameworkError::ActorDropped));
                }
            }
        }
    }
}

async fn run_query<T: ActorEntity>(
    substrate: &Substrate,
    key: &T::Key,
    query: T::Query,
    ctx: &T::Context,
) -> Result<T::QueryResult, FrameworkError> {
    let snapshot: T = substrate
        .store()
        .load::<T>(T::KIND, &key.to_string())?
        .unwrap_or_default();
    snapshot
        .handle_query(query, key, ctx)
        .await
        .map_err(|e| FrameworkError::EntityError(Box::new(e)))
}

async fn run_instance<T: ActorEntity>(
    key: T::Key,
    mut mailbox: mpsc::UnboundedReceiver<Envelope<T>>,
    own: mpsc::WeakUnboundedSender<Envelope<T>>,
    substrate: Substrate,
    context: T::Context,
) {
    let entity_type = T::KIND;
    let mut state: Option<T> = None;

    while let Some(envelope) = mailbox.recv().await {
        match envelope {
            Envelope::Evict { respond_to } => {
                state = None;
                debug!(entity_type, %key, "Evicted");
                let _ = respond_to.send(Ok(()));
            }
            Envelope::Action { action, respond_to } => {
                let current = match state.take() {
                    Some(current) => current,
                    None => match activate::<T>(&key, &substrate, &context).await {
                        Ok(activated) => activated,
                        Err(e) => {
                            warn!(entity_type, %key, error = %e, "Activation failed");
                            reply(respond_to, Err(e));
                            continue;
                        }
                    },
                };

                let (next, result) = invoke::<T>(&key, current, action, &own, &substrate, &context).await;
                state = Some(next);
                match &result {
                    Ok(_) => info!(entity_type, %key, "Action ok"),
                    Err(e) => warn!(entity_type, %key, error = %e, "Action failed"),
                }
                reply(respond_to, result);
            }
        }
    }
}

fn reply<R>(respond_to: Option<Response<R>>, result: Result<R, FrameworkError>) {
    if let Some(respond_to) = respond_to {
        let _ = respond_to.send(result);
    }
}

async fn activate<T: ActorEntity>(
    key: &T::Key,
    substrate: &Substrate,
    context: &T::Context,
) -> Result<T, FrameworkError> {
    let mut state = substrate
        .store()
        .load::<T>(T::KIND, &key.to_string())?
        .unwrap_or_default();
    state
        .on_activate(key, context)
        .await
        .map_err(|e| FrameworkError::EntityError(Box::new(e)))?;
    debug!(entity_type = T::KIND, %key, "Activated");
    Ok(state)
}

async fn invoke<T: ActorEntity>(
    key: &T::Key,
    current: T,
    action: T::Action,
    own: &mpsc::WeakUnboundedSender<Envelope<T>>,
    substrate: &Substrate,
    context: &T::Context,
) -> (T, Result<T::ActionResult, FrameworkError>) {
    let entity_type = T::KIND;
    let invocation = Invocation::<T>::new(key.clone(), substrate.clone(), Some(own.clone()));
    let mut delays = substrate.invocation_retry().delays();
    let mut attempt = 1;

    let (state, result) = loop {
        let mut working = current.clone();
        match working.handle_action(action.clone(), &invocation, context).await {
            Ok(value) => break (working, Ok(value)),
            Err(e) if T::is_transient(&e) => {
                if invocation.was_checkpointed() {
                    // Roll the published snapshot back to the state the replay starts from.
                    if let Err(restore) = substrate.store().save(T::KIND, &key.to_string(), &current) {
                        error!(entity_type, %key, error = %restore, "Snapshot restore failed");
                    }
                }
                let Some(delay) = delays.next() else {
                    break (current, Err(FrameworkError::EntityError(Box::new(e))));
                };
                warn!(entity_type, %key, attempt, error = %e, "Transient failure, replaying invocation");
                invocation.rewind();
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => break (working, Err(FrameworkError::EntityError(Box::new(e)))),
        }
    };

    substrate.store().clear_journal(&invocation.id());
    if let Err(e) = substrate.store().save(T::KIND, &key.to_string(), &state) {
        error!(entity_type, %key, error = %e, "Commit failed");
        return (state, Err(e));
    }
    (state, result)
}
