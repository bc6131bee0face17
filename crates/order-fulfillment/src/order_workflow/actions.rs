//! Actions and queries of the order workflow.

use crate::model::{CheckoutReceipt, OrderDetails, OrderRequest, OrderStatus};
use durable_actor::AwakeableId;

#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Admits the order: reserves stock, persists it PENDING and collects payment.
    /// Repeating it for an existing order returns the current receipt.
    Checkout(OrderRequest),
    /// Suspends on the continuation token of an invoice checkout and finishes the order once
    /// the token is resolved. Queued by Checkout itself.
    AwaitPayment,
    Ship,
    Deliver,
    /// Cancelling an already cancelled order is a no-op.
    Cancel { reason: String },
    Confirm,
    /// Refunds the payment and puts the stock back.
    Return { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderActionResult {
    Checkout(CheckoutReceipt),
    /// Status after an AwaitPayment or a manual transition.
    Status(OrderStatus),
}

#[derive(Debug, Clone)]
pub enum OrderQuery {
    GetOrder,
    /// The continuation token a PENDING invoice order is parked on.
    ContinuationToken,
}

#[derive(Debug, Clone)]
pub enum OrderQueryResult {
    Details(Box<OrderDetails>),
    ContinuationToken(Option<AwakeableId>),
}
