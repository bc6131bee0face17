//! # Order Fulfillment
//!
//! The orchestration core of a multi-merchant store: five keyed actors running on the
//! [`durable_actor`] runtime, a persistence gateway, and typed clients.
//!
//! ## Module Tour
//!
//! ### 1. The Actors
//! - [`order_workflow`]: the controller. Admits an order against the merchant's stock,
//!   collects payment, creates the shipment and walks the order through
//!   `PENDING → PROCESSING → SHIPPED → DELIVERED`.
//! - [`payment_actor`]: charges (with retried transient gateway failures), invoices, settles
//!   and refunds. Idempotent per payment id.
//! - [`shipment_actor`]: creates one shipment per order and tracks it.
//! - [`inventory_actor`]: one merchant's catalog and stock; every stock movement on a
//!   merchant is serialized.
//! - [`cart_actor`]: a single-merchant shopping cart per customer.
//!
//! ### 2. The Interface ([`clients`])
//! Domain clients wrapping `ResourceClient`. [`OrderClient`](clients::OrderClient) is the
//! public surface, including the payment webhook and cart checkout.
//!
//! ### 3. The Plumbing
//! - [`persistence`]: the relational copies of orders, payments, shipments and items.
//! - [`lifecycle`]: [`FulfillmentSystem`](lifecycle::FulfillmentSystem) starts and stops
//!   everything.
//! - [`config`]: layered configuration (`fulfillment.toml` plus `FULFILLMENT__*` variables).
//! - [`error`]: the [`ErrorKind`](error::ErrorKind) every actor error maps onto.
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run -p order-fulfillment
//! FULFILLMENT__WORKFLOW__STAGE_DELAY_MS=2000 RUST_LOG=info cargo run -p order-fulfillment
//! ```

pub mod cart_actor;
pub mod clients;
pub mod config;
pub mod error;
pub mod inventory_actor;
pub mod lifecycle;
pub mod model;
pub mod order_workflow;
pub mod payment_actor;
pub mod persistence;
pub mod shipment_actor;
