//! # ActorClient Trait
//!
//! Provides a common interface for domain clients, adding default `get` and `evict` methods
//! built on top of a generic `ResourceClient`, plus the typed error recovery every domain
//! client needs.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for domain clients wrapping a `ResourceClient`.
///
/// Implementors supply `inner()` and a fallback `map_error()` for framework failures;
/// [`ActorClient::lift_error`] first tries to recover the actor's own error type from the
/// response, so a `NotFound` raised inside the actor reaches the caller as a `NotFound`.
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The domain error type.
    type Error: std::error::Error + From<String> + Send + Sync + 'static;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors (closed channels, journal failures) to the domain error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Recovers the typed entity error if present, otherwise falls back to `map_error`.
    fn lift_error(e: FrameworkError) -> Self::Error {
        match e.into_entity_error::<Self::Error>() {
            Ok(typed) => typed,
            Err(other) => Self::map_error(other),
        }
    }

    /// Fetch the committed snapshot of a key.
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: T::Key) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(key).await.map_err(Self::map_error)
    }

    /// Drop the in-memory instance of a key.
    #[tracing::instrument(skip(self))]
    async fn evict(&self, key: T::Key) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().evict(key).await.map_err(Self::map_error)
    }
}
