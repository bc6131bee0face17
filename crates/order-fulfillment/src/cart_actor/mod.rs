//! # Cart Actor
//!
//! Keyed by customer id. A cart holds the lines of exactly one merchant; the merchant is
//! fixed by the first AddToCart and released again when the cart becomes empty.
//!
//! The actor depends on the inventory client (its `Context`) to check every line against
//! the merchant's current stock.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::Cart;
use durable_actor::{ResourceActor, ResourceClient, Substrate};

/// Creates a new Cart actor and its client.
pub fn new(buffer_size: usize, substrate: Substrate) -> (ResourceActor<Cart>, ResourceClient<Cart>) {
    ResourceActor::new(buffer_size, substrate)
}
