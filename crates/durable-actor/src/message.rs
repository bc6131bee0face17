//! # Generic Messages
//!
//! Message types exchanged between `ResourceClient`, the per-type router and the per-key
//! instances.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Request sent to a `ResourceActor`.
///
/// - **Get**: the committed snapshot of a key (`None` if the key was never written).
/// - **Action**: exclusive operation; `respond_to` is `None` for one-way sends.
/// - **Query**: shared read-only operation.
/// - **Evict**: drop the in-memory instance state; the next action rebuilds it.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Get {
        key: T::Key,
        respond_to: Response<Option<T>>,
    },
    Action {
        key: T::Key,
        action: T::Action,
        respond_to: Option<Response<T::ActionResult>>,
    },
    Query {
        key: T::Key,
        query: T::Query,
        respond_to: Response<T::QueryResult>,
    },
    Evict {
        key: T::Key,
        respond_to: Response<()>,
    },
}

/// What a per-key instance receives from the router.
#[derive(Debug)]
pub(crate) enum Envelope<T: ActorEntity> {
    Action {
        action: T::Action,
        respond_to: Option<Response<T::ActionResult>>,
    },
    Evict {
        respond_to: Response<()>,
    },
}
