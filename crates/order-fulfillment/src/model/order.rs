use crate::model::{
    CustomerId, ItemId, ItemRequest, MerchantId, OrderId, PaymentId, PaymentMethod, PaymentReceipt, ShipmentId,
    StockLine, TrackingInfo,
};
use chrono::{DateTime, Utc};
use durable_actor::AwakeableId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Returned,
}

impl OrderStatus {
    /// The legal edges of the order state machine.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Delivered, Completed)
                | (Delivered, Returned)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Returned
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one purchased item, independent of later catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// The order record owned by the order workflow.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](durable_actor::ActorEntity) trait; see
/// [`crate::order_workflow`] for the lifecycle it drives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub merchant_id: MerchantId,
    /// `None` until admission succeeds.
    pub status: Option<OrderStatus>,
    pub total_amount: f64,
    pub lines: Vec<OrderLine>,
    pub payment_id: Option<PaymentId>,
    pub shipment_id: Option<ShipmentId>,
    pub tracking_number: Option<String>,
    /// Token an invoice checkout is parked on.
    pub continuation_token: Option<AwakeableId>,
    pub invoice_url: Option<String>,
    pub cancellation_reason: Option<String>,
    pub refund_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.lines
            .iter()
            .map(|line| StockLine {
                item_id: line.item_id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }
}

/// How CreateOrder collects payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutMode {
    /// Charge immediately and run the order to its terminal status before returning.
    Synchronous(PaymentMethod),
    /// Issue an invoice, return at once, and resume when the provider confirms payment.
    Invoice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub customer_id: CustomerId,
    pub merchant_id: MerchantId,
    pub items: Vec<ItemRequest>,
    pub mode: CheckoutMode,
}

/// What CreateOrder returns: the terminal status for synchronous checkout, or PENDING with
/// the invoice for invoice checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub payment_id: Option<PaymentId>,
    pub invoice_url: Option<String>,
    pub tracking_number: Option<String>,
}

/// GetOrder: the order composed with its payment and shipment sub-state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub merchant_id: MerchantId,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub lines: Vec<OrderLine>,
    pub invoice_url: Option<String>,
    pub cancellation_reason: Option<String>,
    pub payment: Option<PaymentReceipt>,
    pub shipment: Option<TrackingInfo>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row of ListOrders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub merchant_id: MerchantId,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn automatic_path_is_a_chain() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Delivered.can_transition_to(Processing));
    }

    #[test]
    fn cancellation_only_from_pending() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
    }

    #[test]
    fn delivered_orders_can_be_confirmed_or_returned() {
        assert!(Delivered.can_transition_to(Completed));
        assert!(Delivered.can_transition_to(Returned));
        assert!(!Completed.can_transition_to(Returned));
    }
}
