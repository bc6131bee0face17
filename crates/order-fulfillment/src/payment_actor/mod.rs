//! # Payment Actor
//!
//! Keyed by payment id. Charges synchronously through a [`PaymentProcessor`] or issues an
//! invoice that a provider notification settles later. Refunds are accepted only for
//! COMPLETED payments.

pub mod actions;
pub mod entity;
pub mod error;
pub mod processor;

pub use actions::*;
pub use error::*;
pub use processor::{AttemptOutcome, PaymentProcessor, ScriptedProcessor, SimulatedProcessor};

use crate::config::PaymentConfig;
use crate::model::Payment;
use crate::persistence::SharedGateway;
use durable_actor::{ResourceActor, ResourceClient, Substrate};
use std::sync::Arc;

#[derive(Clone)]
pub struct PaymentContext {
    pub gateway: SharedGateway,
    pub processor: Arc<dyn PaymentProcessor>,
    pub settings: PaymentConfig,
}

/// Creates a new Payment actor and its client.
pub fn new(buffer_size: usize, substrate: Substrate) -> (ResourceActor<Payment>, ResourceClient<Payment>) {
    ResourceActor::new(buffer_size, substrate)
}
