//! # Payment Client
//!
//! Provides a high‑level API for interacting with the `Payment` actor.
use crate::model::{OrderId, Payment, PaymentId, PaymentMethod, PaymentOutcome, PaymentReceipt, RefundReceipt};
use crate::payment_actor::{PaymentAction, PaymentActionResult, PaymentError, PaymentQuery, PaymentQueryResult};
use async_trait::async_trait;
use durable_actor::{ActorClient, FrameworkError, ResourceClient};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Client for interacting with the Payment actor.
#[derive(Clone)]
pub struct PaymentClient {
    inner: ResourceClient<Payment>,
}

#[async_trait]
impl ActorClient<Payment> for PaymentClient {
    type Error = PaymentError;

    fn inner(&self) -> &ResourceClient<Payment> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        PaymentError::ActorCommunicationError(e.to_string())
    }
}

fn unexpected(response: impl Debug) -> PaymentError {
    PaymentError::ActorCommunicationError(format!("unexpected response: {response:?}"))
}

impl PaymentClient {
    pub fn new(inner: ResourceClient<Payment>) -> Self {
        Self { inner }
    }

    async fn act(&self, payment_id: PaymentId, action: PaymentAction) -> Result<PaymentActionResult, PaymentError> {
        debug!("Sending request");
        self.inner
            .perform_action(payment_id, action)
            .await
            .map_err(Self::lift_error)
    }

    /// Charges synchronously. A FAILED receipt is a normal outcome, not an error.
    #[instrument(skip(self))]
    pub async fn process_payment(
        &self,
        payment_id: PaymentId,
        order_id: OrderId,
        amount: f64,
        method: PaymentMethod,
    ) -> Result<PaymentReceipt, PaymentError> {
        match self
            .act(
                payment_id,
                PaymentAction::ProcessPayment {
                    order_id,
                    amount,
                    method,
                },
            )
            .await?
        {
            PaymentActionResult::ProcessPayment(receipt) => Ok(receipt),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn issue_invoice(
        &self,
        payment_id: PaymentId,
        order_id: OrderId,
        amount: f64,
    ) -> Result<PaymentReceipt, PaymentError> {
        match self
            .act(payment_id, PaymentAction::IssueInvoice { order_id, amount })
            .await?
        {
            PaymentActionResult::IssueInvoice(receipt) => Ok(receipt),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn settle_payment(
        &self,
        payment_id: PaymentId,
        outcome: PaymentOutcome,
    ) -> Result<PaymentReceipt, PaymentError> {
        match self.act(payment_id, PaymentAction::SettlePayment(outcome)).await? {
            PaymentActionResult::SettlePayment(receipt) => Ok(receipt),
            other => Err(unexpected(other)),
        }
    }

    /// `amount <= 0` refunds the full payment.
    #[instrument(skip(self))]
    pub async fn process_refund(
        &self,
        payment_id: PaymentId,
        amount: f64,
        reason: String,
    ) -> Result<RefundReceipt, PaymentError> {
        match self
            .act(payment_id, PaymentAction::ProcessRefund { amount, reason })
            .await?
        {
            PaymentActionResult::ProcessRefund(receipt) => Ok(receipt),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        debug!("Sending request");
        match self
            .inner
            .query(payment_id, PaymentQuery::GetPayment)
            .await
            .map_err(Self::lift_error)?
        {
            PaymentQueryResult::Payment(payment) => Ok(payment),
        }
    }
}
