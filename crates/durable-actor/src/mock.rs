//! # Mock Framework & Testing Guide
//!
//! `MockClient<T>` hands out a real `ResourceClient<T>` whose requests are answered from a
//! queue of expectations instead of an actor. It lets an actor under test run against
//! scripted dependencies, and makes failures that are hard to provoke for real (a closed
//! mailbox, a downstream error) trivial to inject.
//!
//! ## When to use Mocks vs Real Actors
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **Speed** | Instant (in-memory) | Fast (but involves tokio spawn) |
//! | **Determinism** | 100% Deterministic | Subject to scheduler |
//! | **State** | No real state (expectations) | Real state management |
//! | **Use Case** | Unit testing logic *around* the client | Testing the actor itself or full system |
//! | **Error Injection** | Easy (`return_err`) | Hard (requires specific state) |
//!
//! ## Testing Strategies
//!
//! 1. **Client logic**: wrap `mock.client()` in the domain client and assert on its results.
//! 2. **Single actor**: spawn a real `ResourceActor` with a `Substrate` and no dependencies.
//! 3. **Actor with mocked dependencies**: spawn the actor under test with a context built
//!    from mock clients (see `order_workflow_test.rs` in the fulfillment crate).
//! 4. **Full system**: start every actor and drive end-to-end flows.
//!
//! ```rust,ignore
//! let mut payments = MockClient::<Payment>::new();
//! payments
//!     .expect_action(PaymentId::from("pay_1"))
//!     .return_ok(PaymentActionResult::ProcessPayment(receipt));
//!
//! let client = PaymentClient::new(payments.client());
//! // ... run the code under test ...
//! payments.verify();
//! ```
//!
//! Use [`create_mock_client`] with [`expect_action`] / [`expect_query`] when the test wants
//! to inspect the request itself before answering it.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Expectation<T: ActorEntity> {
    Get {
        key: T::Key,
        response: Result<Option<T>, FrameworkError>,
    },
    Action {
        key: T::Key,
        response: Result<T::ActionResult, FrameworkError>,
    },
    Query {
        key: T::Key,
        response: Result<T::QueryResult, FrameworkError>,
    },
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client with expectation tracking for fluent testing.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    received: Arc<Mutex<Vec<(T::Key, T::Action)>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let pending = expectations.clone();
        let log = received.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = pending.lock().pop_front();

                match (request, expectation) {
                    (ResourceRequest::Get { key, respond_to }, Some(Expectation::Get { key: expected, response }))
                        if key == expected =>
                    {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Action {
                            key,
                            action,
                            respond_to,
                        },
                        Some(Expectation::Action { key: expected, response }),
                    ) if key == expected => {
                        log.lock().push((key, action));
                        if let Some(respond_to) = respond_to {
                            let _ = respond_to.send(response);
                        }
                    }
                    (
                        ResourceRequest::Query {
                            key, respond_to, ..
                        },
                        Some(Expectation::Query { key: expected, response }),
                    ) if key == expected => {
                        let _ = respond_to.send(response);
                    }
                    (request, _) => {
                        panic!("Unexpected request or expectation mismatch: {:?}", request);
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            received,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` request.
    pub fn expect_get(&mut self, key: T::Key) -> GetExpectationBuilder<T> {
        GetExpectationBuilder {
            key,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an action (request/response or one-way).
    pub fn expect_action(&mut self, key: T::Key) -> ActionExpectationBuilder<T> {
        ActionExpectationBuilder {
            key,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a query.
    pub fn expect_query(&mut self, key: T::Key) -> QueryExpectationBuilder<T> {
        QueryExpectationBuilder {
            key,
            expectations: self.expectations.clone(),
        }
    }

    /// Actions received so far, in arrival order.
    pub fn received_actions(&self) -> Vec<(T::Key, T::Action)> {
        self.received.lock().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

/// Builder for `get` expectations.
pub struct GetExpectationBuilder<T: ActorEntity> {
    key: T::Key,
    expectations: Expectations<T>,
}

impl<T: ActorEntity> GetExpectationBuilder<T> {
    pub fn return_ok(self, value: Option<T>) {
        self.expectations.lock().push_back(Expectation::Get {
            key: self.key,
            response: Ok(value),
        });
    }

    pub fn return_err(self, error: FrameworkError) {
        self.expectations.lock().push_back(Expectation::Get {
            key: self.key,
            response: Err(error),
        });
    }
}

/// Builder for action expectations.
pub struct ActionExpectationBuilder<T: ActorEntity> {
    key: T::Key,
    expectations: Expectations<T>,
}

impl<T: ActorEntity> ActionExpectationBuilder<T> {
    pub fn return_ok(self, result: T::ActionResult) {
        self.expectations.lock().push_back(Expectation::Action {
            key: self.key,
            response: Ok(result),
        });
    }

    pub fn return_err(self, error: FrameworkError) {
        self.expectations.lock().push_back(Expectation::Action {
            key: self.key,
            response: Err(error),
        });
    }

    /// Answers with the actor's own typed error, as a real actor would.
    pub fn return_entity_err(self, error: T::Error) {
        self.return_err(FrameworkError::EntityError(Box::new(error)));
    }
}

/// Builder for query expectations.
pub struct QueryExpectationBuilder<T: ActorEntity> {
    key: T::Key,
    expectations: Expectations<T>,
}

impl<T: ActorEntity> QueryExpectationBuilder<T> {
    pub fn return_ok(self, result: T::QueryResult) {
        self.expectations.lock().push_back(Expectation::Query {
            key: self.key,
            response: Ok(result),
        });
    }

    pub fn return_err(self, error: FrameworkError) {
        self.expectations.lock().push_back(Expectation::Query {
            key: self.key,
            response: Err(error),
        });
    }

    pub fn return_entity_err(self, error: T::Error) {
        self.return_err(FrameworkError::EntityError(Box::new(error)));
    }
}

// =============================================================================
// CHANNEL-LEVEL HELPERS
// =============================================================================

/// Creates a client and the receiver its requests arrive on, so a test can inspect each
/// request before answering it.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is an Action request.
/// The responder is `None` for one-way sends.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Key,
    T::Action,
    Option<oneshot::Sender<Result<T::ActionResult, FrameworkError>>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            key,
            action,
            respond_to,
        }) => Some((key, action, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Query request.
pub async fn expect_query<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Key,
    T::Query,
    oneshot::Sender<Result<T::QueryResult, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Query {
            key,
            query,
            respond_to,
        }) => Some((key, query, respond_to)),
        _ => None,
    }
}
