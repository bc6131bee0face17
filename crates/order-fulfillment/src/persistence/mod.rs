//! # Persistence Gateway
//!
//! Relational copies of orders, order lines, payments, shipments and merchant items. Every
//! write is an idempotent upsert keyed by primary id ("insert or update, bump `updated_at`"),
//! so at-least-once delivery from a replayed step is harmless.
//!
//! The rows are derived data for list and detail views. In-flight decisions (stock checks,
//! idempotency guards) always consult the owning actor's state, never the gateway.
//!
//! One gateway object is constructed at startup and handed to every actor through its
//! context.
//!
//! # Implementations
//!
//! - [`InMemoryGateway`]: in-process tables with failure injection for tests and the demo

pub mod memory;

pub use memory::InMemoryGateway;

use crate::model::{
    CustomerId, ItemId, MerchantId, MerchantItem, OrderId, OrderLine, OrderStatus, PaymentId, PaymentStatus,
    ShipmentId, ShipmentStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use durable_actor::StepError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// The store could not be reached. Callers may retry.
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
    /// The write violates a table constraint; retrying will not help.
    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Inside a durable step an unavailable store is worth retrying; a constraint violation is not.
impl From<GatewayError> for StepError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unavailable(reason) => StepError::Transient(reason),
            GatewayError::Constraint(reason) => StepError::Terminal(reason),
        }
    }
}

/// Shared handle passed into every actor context.
pub type SharedGateway = Arc<dyn PersistenceGateway>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub merchant_id: MerchantId,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub payment_id: Option<PaymentId>,
    pub shipment_id: Option<ShipmentId>,
    pub tracking_number: Option<String>,
    pub continuation_token: Option<String>,
    pub invoice_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRow {
    pub order_id: OrderId,
    pub merchant_id: MerchantId,
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
}

impl OrderLineRow {
    pub fn from_line(order_id: &OrderId, merchant_id: &MerchantId, line: &OrderLine) -> Self {
        Self {
            order_id: order_id.clone(),
            merchant_id: merchant_id.clone(),
            item_id: line.item_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: f64,
    pub method: String,
    pub status: PaymentStatus,
    pub invoice_url: Option<String>,
    pub refund_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRow {
    pub shipment_id: ShipmentId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub carrier: String,
    pub service_type: String,
    pub status: ShipmentStatus,
    pub current_location: String,
    pub estimated_delivery: Option<NaiveDate>,
}

/// A row as read back, with the timestamps the gateway maintains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamped<R> {
    pub row: R,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Inserts or updates an order. `merchant_id` of an existing row is never changed.
    async fn upsert_order(&self, row: &OrderRow) -> Result<(), GatewayError>;

    /// Upserts the lines of an order, keyed by (order, item).
    async fn upsert_order_lines(&self, lines: &[OrderLineRow]) -> Result<(), GatewayError>;

    async fn upsert_payment(&self, row: &PaymentRow) -> Result<(), GatewayError>;

    async fn upsert_shipment(&self, row: &ShipmentRow) -> Result<(), GatewayError>;

    async fn upsert_merchant_item(&self, merchant_id: &MerchantId, item: &MerchantItem) -> Result<(), GatewayError>;

    /// Returns whether a row was removed.
    async fn delete_merchant_item(&self, merchant_id: &MerchantId, item_id: &ItemId) -> Result<bool, GatewayError>;

    /// A merchant's catalog, in insertion order.
    async fn list_merchant_items(&self, merchant_id: &MerchantId) -> Result<Vec<MerchantItem>, GatewayError>;

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Stamped<OrderRow>>, GatewayError>;

    /// Orders newest first, optionally for one customer.
    async fn list_orders(&self, customer_id: Option<&CustomerId>) -> Result<Vec<Stamped<OrderRow>>, GatewayError>;

    /// Resolves a provider's external reference (the payment id) to its order.
    async fn find_order_by_payment(&self, payment_id: &PaymentId) -> Result<Option<OrderId>, GatewayError>;

    async fn order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLineRow>, GatewayError>;

    async fn get_payment(&self, payment_id: &PaymentId) -> Result<Option<Stamped<PaymentRow>>, GatewayError>;

    async fn get_shipment(&self, shipment_id: &ShipmentId) -> Result<Option<Stamped<ShipmentRow>>, GatewayError>;
}
