//! Actions for the Payment actor.
//!
//! Every action is idempotent on the payment key: once a payment has reached a terminal
//! status, repeating an action returns the cached result without touching the gateway.

use crate::model::{OrderId, Payment, PaymentMethod, PaymentOutcome, PaymentReceipt, RefundReceipt};

#[derive(Debug, Clone)]
pub enum PaymentAction {
    /// Charges synchronously through the payment processor. Retries transient gateway
    /// failures; the receipt carries COMPLETED or FAILED.
    ProcessPayment {
        order_id: OrderId,
        amount: f64,
        method: PaymentMethod,
    },
    /// Opens a PENDING invoice for asynchronous checkout.
    IssueInvoice { order_id: OrderId, amount: f64 },
    /// Applies the provider's final outcome to a pending invoice.
    SettlePayment(PaymentOutcome),
    /// Refunds a COMPLETED payment. `amount <= 0` refunds the full amount.
    ProcessRefund { amount: f64, reason: String },
}

/// Results from PaymentActions - variants match 1:1 with PaymentAction
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentActionResult {
    ProcessPayment(PaymentReceipt),
    IssueInvoice(PaymentReceipt),
    SettlePayment(PaymentReceipt),
    ProcessRefund(RefundReceipt),
}

#[derive(Debug, Clone)]
pub enum PaymentQuery {
    GetPayment,
}

#[derive(Debug, Clone)]
pub enum PaymentQueryResult {
    Payment(Payment),
}
