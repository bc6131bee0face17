//! Typed clients, one per actor. Each wraps a `ResourceClient` and turns actions and
//! queries into plain async methods returning the actor's own error type.

pub mod cart_client;
pub mod inventory_client;
pub mod order_client;
pub mod payment_client;
pub mod shipment_client;

pub use cart_client::CartClient;
pub use inventory_client::InventoryClient;
pub use order_client::{OrderClient, WebhookOutcome};
pub use payment_client::PaymentClient;
pub use shipment_client::ShipmentClient;
