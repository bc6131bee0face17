//! # Order Workflow
//!
//! Keyed by order id; the controller of the fulfillment process. Admission talks to the
//! merchant inventory, then the payment actor, then the shipment actor, advancing the order
//! status and persisting it at each stage.
//!
//! ## Payment continuation
//!
//! Every checkout parks on a continuation token (an awakeable). Synchronous checkout charges
//! the card and resolves its own token straight away; invoice checkout hands the token to the
//! outside world and queues [`OrderAction::AwaitPayment`], which waits until a provider
//! notification or a cancellation resolves it.
//!
//! ```rust,ignore
//! let receipt = orders.create_order(request).await?;            // PENDING, invoice_url set
//! orders.on_payment_update(payment_id, "PAID".into()).await?;   // resumes the workflow
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::{InventoryClient, PaymentClient, ShipmentClient};
use crate::config::WorkflowConfig;
use crate::model::Order;
use crate::persistence::SharedGateway;
use durable_actor::{ResourceActor, ResourceClient, Substrate};

/// Dependencies injected into the order workflow through `run(context)`.
#[derive(Clone)]
pub struct OrderContext {
    pub inventory: InventoryClient,
    pub payments: PaymentClient,
    pub shipments: ShipmentClient,
    pub gateway: SharedGateway,
    pub settings: WorkflowConfig,
}

/// Creates a new Order actor and its client.
pub fn new(buffer_size: usize, substrate: Substrate) -> (ResourceActor<Order>, ResourceClient<Order>) {
    ResourceActor::new(buffer_size, substrate)
}
