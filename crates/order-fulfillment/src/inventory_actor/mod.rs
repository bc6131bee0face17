//! # Merchant Inventory Actor
//!
//! Keyed by merchant id; holds that merchant's whole catalog and its stock.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](durable_actor::ActorEntity) implementation for [`MerchantInventory`]
//! - [`error`] - [`InventoryError`]
//! - [`actions`] - [`InventoryAction`], [`InventoryQuery`] and their results
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Serialized stock
//!
//! Every mutating action on one merchant runs alone, so two orders competing for the last
//! units of an item cannot both pass the stock check:
//!
//! ```rust,ignore
//! // Both lines are deducted, or neither is.
//! inventory.reserve_stock(merchant_id, vec![line_a, line_b]).await?;
//!
//! // Compensation after a failed payment.
//! inventory.release_stock(merchant_id, vec![line_a, line_b]).await?;
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::config::InventoryConfig;
use crate::model::MerchantInventory;
use crate::persistence::SharedGateway;
use durable_actor::{ResourceActor, ResourceClient, Substrate};

/// Dependencies injected into the inventory actor through `run(context)`.
#[derive(Clone)]
pub struct InventoryContext {
    pub gateway: SharedGateway,
    pub settings: InventoryConfig,
}

/// Creates a new MerchantInventory actor and its client.
pub fn new(
    buffer_size: usize,
    substrate: Substrate,
) -> (ResourceActor<MerchantInventory>, ResourceClient<MerchantInventory>) {
    ResourceActor::new(buffer_size, substrate)
}
