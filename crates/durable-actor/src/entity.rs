//! # ActorEntity Trait
//!
//! The `ActorEntity` trait defines the contract every keyed actor (merchant inventory, cart,
//! payment, shipment, order, …) implements to be hosted by the generic [`ResourceActor`].
//! The implementing type *is* the per-key state: one value per key, created with
//! `Default`, persisted as a serde snapshot after every action and rebuilt from that
//! snapshot when an evicted key is touched again.
//!
//! # Actions and Queries
//! - **Actions** are exclusive. For one key they run strictly one at a time, in submission
//!   order, with `&mut self`. They receive an [`Invocation`] handle for durable steps,
//!   timers, awakeables and checkpoints.
//! - **Queries** are shared. They run concurrently against the last committed snapshot and
//!   never see the half-applied state of an in-flight action.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_activate`] runs whenever an instance is (re)constructed, before the
//!   first action it processes.
//! - [`ActorEntity::is_transient`] decides whether a failed action is replayed by the runtime.
//!
//! [`ResourceActor`]: crate::ResourceActor

use crate::context::Invocation;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any keyed entity must implement to be managed by `ResourceActor`.
///
/// # Async & Context
/// This trait is `#[async_trait]` so hooks can call other actors. The `Context` type is
/// injected into every hook through `run(context)` ("late binding"), which lets actors
/// depend on each other's clients without construction-order problems.
#[async_trait]
pub trait ActorEntity:
    Clone + Default + Serialize + DeserializeOwned + Debug + Send + Sync + 'static
{
    /// Key addressing one instance (merchant id, customer id, order id, …).
    type Key: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// Exclusive, state-mutating operations. `Clone` because a transient failure replays
    /// the invocation with the same action.
    type Action: Clone + Send + Sync + Debug + 'static;

    /// The result type returned by actions.
    type ActionResult: Send + Sync + Debug + 'static;

    /// Shared, read-only operations.
    type Query: Send + Sync + Debug + 'static;

    /// The result type returned by queries.
    type QueryResult: Send + Sync + Debug + 'static;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Clone + Send + Sync + 'static;

    /// One error enum for the whole actor.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name of the actor type; namespaces snapshots in the durable store and tags log lines.
    const KIND: &'static str;

    /// Called when an instance is constructed from its snapshot (or from `Default`).
    async fn on_activate(&mut self, _key: &Self::Key, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle an exclusive action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        inv: &Invocation<Self>,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Handle a shared query against the committed snapshot.
    async fn handle_query(
        &self,
        query: Self::Query,
        key: &Self::Key,
        ctx: &Self::Context,
    ) -> Result<Self::QueryResult, Self::Error>;

    /// Errors for which the runtime replays the whole invocation. Journaled steps are not
    /// re-executed on replay.
    fn is_transient(_error: &Self::Error) -> bool {
        false
    }
}
