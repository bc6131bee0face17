//! # Durable Actor
//!
//! Keyed actors on top of Tokio, with an in-process durable execution substrate.
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - the per-key state type and its handlers
//! 2. **Runtime Layer** ([`ResourceActor`]) - routing, one single-writer instance per key
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - type-safe communication
//! 4. **Substrate** ([`Substrate`], [`Invocation`]) - snapshots, journaled steps, durable
//!    timers and awakeables
//!
//! Business logic is written once, in the entity. The runtime guarantees that mutating
//! actions on one key never overlap, that queries only see committed state, and that a
//! replayed invocation does not repeat journaled side effects.
//!
//! ## Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use durable_actor::{ActorEntity, Invocation, ResourceActor, Substrate};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Default, Serialize, Deserialize)]
//! struct Counter { value: u64 }
//!
//! #[derive(Clone, Debug)] enum CounterAction { Add(u64) }
//! #[derive(Debug)] enum CounterQuery { Value }
//! #[derive(Debug, thiserror::Error)] #[error("counter error")] struct CounterError;
//!
//! #[async_trait]
//! impl ActorEntity for Counter {
//!     type Key = String;
//!     type Action = CounterAction;
//!     type ActionResult = u64;
//!     type Query = CounterQuery;
//!     type QueryResult = u64;
//!     type Context = ();
//!     type Error = CounterError;
//!     const KIND: &'static str = "Counter";
//!
//!     async fn handle_action(&mut self, action: CounterAction, _: &Invocation<Self>, _: &()) -> Result<u64, CounterError> {
//!         let CounterAction::Add(n) = action;
//!         self.value += n;
//!         Ok(self.value)
//!     }
//!
//!     async fn handle_query(&self, _: CounterQuery, _: &String, _: &()) -> Result<u64, CounterError> {
//!         Ok(self.value)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::<Counter>::new(16, Substrate::new());
//!     tokio::spawn(actor.run(()));
//!
//!     client.perform_action("c1".into(), CounterAction::Add(2)).await.unwrap();
//!     assert_eq!(client.query("c1".into(), CounterQuery::Value).await.unwrap(), 2);
//! }
//! ```
//!
//! ## Context Injection
//!
//! Dependencies are injected at **runtime** via `run(context)`, not at construction time,
//! so an actor can be handed the clients of actors created after it.
//!
//! ## Testing
//!
//! See the [`mock`] module for `MockClient` and the channel-level helpers.

pub mod actor;
pub mod awakeable;
pub mod client;
pub mod client_trait;
pub mod context;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod retry;
pub mod store;
pub mod substrate;
pub mod tracing;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use awakeable::{Awakeable, AwakeableId};
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use context::Invocation;
pub use entity::ActorEntity;
pub use error::{FrameworkError, StepError};
pub use message::{ResourceRequest, Response};
pub use retry::RetryPolicy;
pub use substrate::Substrate;
