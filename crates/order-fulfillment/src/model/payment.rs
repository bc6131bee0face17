use crate::model::{OrderId, PaymentId};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// How the customer pays. One variant per method accepted at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard { last_four: String },
    BankTransfer { bank_code: String },
    DigitalWallet { provider: String },
    /// Asynchronous checkout; settled later by a provider notification.
    Invoice,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard { .. } => "CREDIT_CARD",
            PaymentMethod::BankTransfer { .. } => "BANK_TRANSFER",
            PaymentMethod::DigitalWallet { .. } => "DIGITAL_WALLET",
            PaymentMethod::Invoice => "INVOICE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Expired,
    Refunded,
}

impl PaymentStatus {
    /// Terminal statuses are set once; re-invocations return them unchanged.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Expired | PaymentStatus::Refunded
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Expired => "EXPIRED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported for an invoice payment (by the provider, or by cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Paid,
    Failed,
    Expired,
    /// The order was cancelled before the payment was settled.
    Cancelled,
}

impl PaymentOutcome {
    /// Maps a provider's status string. Anything not final is `None` (still pending).
    pub fn from_provider_status(status: &str) -> Option<Self> {
        match status.trim().to_ascii_uppercase().as_str() {
            "PAID" | "SETTLED" => Some(PaymentOutcome::Paid),
            "EXPIRED" => Some(PaymentOutcome::Expired),
            "FAILED" => Some(PaymentOutcome::Failed),
            _ => None,
        }
    }

    pub fn is_paid(self) -> bool {
        self == PaymentOutcome::Paid
    }
}

/// What an order's continuation token is resolved with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSignal {
    pub outcome: PaymentOutcome,
    /// Overrides the order's default cancellation reason.
    pub reason: Option<String>,
}

impl PaymentSignal {
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self {
            outcome: PaymentOutcome::Cancelled,
            reason: Some(reason.into()),
        }
    }
}

impl From<PaymentOutcome> for PaymentSignal {
    fn from(outcome: PaymentOutcome) -> Self {
        Self { outcome, reason: None }
    }
}

/// One payment's lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: f64,
    pub method: Option<PaymentMethod>,
    /// `None` until the first ProcessPayment or IssueInvoice.
    pub status: Option<PaymentStatus>,
    pub invoice_url: Option<String>,
    pub failure_reason: Option<String>,
    pub refund_id: Option<String>,
}

/// What ProcessPayment, IssueInvoice and SettlePayment return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub invoice_url: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub payment_id: PaymentId,
    pub refund_id: String,
    pub amount: f64,
}

impl Payment {
    pub fn receipt(&self, payment_id: &PaymentId) -> Option<PaymentReceipt> {
        let status = self.status?;
        Some(PaymentReceipt {
            payment_id: payment_id.clone(),
            status,
            invoice_url: self.invoice_url.clone(),
            failure_reason: self.failure_reason.clone(),
        })
    }
}
