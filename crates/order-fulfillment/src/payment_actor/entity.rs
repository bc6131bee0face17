//! ActorEntity implementation for payments.
//!
//! The PROCESSING (or PENDING, for invoices) row is a required write: without it the
//! payment never starts. Later status changes are refreshed best-effort since the actor
//! state is authoritative.

use super::actions::{PaymentAction, PaymentActionResult, PaymentQuery, PaymentQueryResult};
use super::error::PaymentError;
use super::processor::AttemptOutcome;
use super::PaymentContext;
use crate::error::check_amount;
use crate::model::{OrderId, Payment, PaymentId, PaymentMethod, PaymentOutcome, PaymentReceipt, PaymentStatus, RefundReceipt};
use crate::persistence::PaymentRow;
use async_trait::async_trait;
use chrono::Utc;
use durable_actor::{ActorEntity, Invocation, StepError};
use tracing::{info, warn};

#[async_trait]
impl ActorEntity for Payment {
    type Key = PaymentId;
    type Action = PaymentAction;
    type ActionResult = PaymentActionResult;
    type Query = PaymentQuery;
    type QueryResult = PaymentQueryResult;
    type Context = PaymentContext;
    type Error = PaymentError;
    const KIND: &'static str = "Payment";

    async fn on_activate(&mut self, key: &PaymentId, _ctx: &PaymentContext) -> Result<(), PaymentError> {
        self.payment_id = key.clone();
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: PaymentAction,
        inv: &Invocation<Self>,
        ctx: &PaymentContext,
    ) -> Result<PaymentActionResult, PaymentError> {
        match action {
            PaymentAction::ProcessPayment {
                order_id,
                amount,
                method,
            } => self
                .process(order_id, amount, method, inv, ctx)
                .await
                .map(PaymentActionResult::ProcessPayment),
            PaymentAction::IssueInvoice { order_id, amount } => self
                .issue_invoice(order_id, amount, inv, ctx)
                .await
                .map(PaymentActionResult::IssueInvoice),
            PaymentAction::SettlePayment(outcome) => self
                .settle(outcome, inv, ctx)
                .await
                .map(PaymentActionResult::SettlePayment),
            PaymentAction::ProcessRefund { amount, reason } => self
                .refund(amount, reason, inv, ctx)
                .await
                .map(PaymentActionResult::ProcessRefund),
        }
    }

    async fn handle_query(
        &self,
        query: PaymentQuery,
        key: &PaymentId,
        _ctx: &PaymentContext,
    ) -> Result<PaymentQueryResult, PaymentError> {
        match query {
            PaymentQuery::GetPayment => {
                if self.status.is_none() {
                    return Err(PaymentError::NotFound(key.clone()));
                }
                let mut payment = self.clone();
                payment.payment_id = key.clone();
                Ok(PaymentQueryResult::Payment(payment))
            }
        }
    }
}

impl Payment {
    async fn process(
        &mut self,
        order_id: OrderId,
        amount: f64,
        method: PaymentMethod,
        inv: &Invocation<Self>,
        ctx: &PaymentContext,
    ) -> Result<PaymentReceipt, PaymentError> {
        let key = inv.key();
        match self.status {
            Some(status) if status.is_terminal() => {
                info!(payment_id = %key, %status, "Payment already settled, returning cached result");
                return Ok(self.current_receipt(key));
            }
            Some(PaymentStatus::Pending) => {
                return Err(PaymentError::StateConflict {
                    payment_id: key.clone(),
                    status: PaymentStatus::Pending,
                    operation: "process an invoiced payment synchronously".into(),
                });
            }
            _ => {}
        }
        if matches!(method, PaymentMethod::Invoice) {
            return Err(PaymentError::Validation("invoice payments are issued, not processed".into()));
        }
        validate(&order_id, amount)?;

        self.order_id = order_id;
        self.amount = amount;
        self.method = Some(method);

        // A re-delivered ProcessPayment finds PROCESSING already recorded.
        if self.status != Some(PaymentStatus::Processing) {
            self.status = Some(PaymentStatus::Processing);
            self.persist_required("persist_processing", inv, ctx).await?;
            info!(payment_id = %key, order_id = %self.order_id, amount, "Payment processing");
        }

        let processor = &ctx.processor;
        let delay = ctx.settings.processing_delay();
        let charged = inv
            .run("charge", || async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match processor.attempt(key, amount) {
                    AttemptOutcome::Success => Ok(()),
                    AttemptOutcome::TransientFailure(reason) => Err(StepError::Transient(reason)),
                }
            })
            .await;

        match charged {
            Ok(()) => {
                self.status = Some(PaymentStatus::Completed);
                info!(payment_id = %key, amount, "Payment completed");
            }
            Err(e @ StepError::Journal { .. }) => return Err(PaymentError::from(e)),
            Err(e) => {
                warn!(payment_id = %key, error = %e, "Payment failed");
                self.status = Some(PaymentStatus::Failed);
                self.failure_reason = Some(e.to_string());
            }
        }
        self.persist_best_effort(key, ctx).await;
        Ok(self.current_receipt(key))
    }

    async fn issue_invoice(
        &mut self,
        order_id: OrderId,
        amount: f64,
        inv: &Invocation<Self>,
        ctx: &PaymentContext,
    ) -> Result<PaymentReceipt, PaymentError> {
        let key = inv.key();
        if self.status.is_some() {
            info!(payment_id = %key, "Invoice already issued, returning cached result");
            return Ok(self.current_receipt(key));
        }
        validate(&order_id, amount)?;

        self.order_id = order_id;
        self.amount = amount;
        self.method = Some(PaymentMethod::Invoice);
        self.invoice_url = Some(format!(
            "{}/invoices/{}",
            ctx.settings.invoice_base_url.trim_end_matches('/'),
            key
        ));
        self.status = Some(PaymentStatus::Pending);
        self.persist_required("persist_invoice", inv, ctx).await?;
        info!(payment_id = %key, order_id = %self.order_id, amount, "Invoice issued");
        Ok(self.current_receipt(key))
    }

    async fn settle(
        &mut self,
        outcome: PaymentOutcome,
        inv: &Invocation<Self>,
        ctx: &PaymentContext,
    ) -> Result<PaymentReceipt, PaymentError> {
        let key = inv.key();
        let status = self.status.ok_or_else(|| PaymentError::NotFound(key.clone()))?;
        if status.is_terminal() {
            info!(payment_id = %key, %status, ?outcome, "Payment already settled");
            return Ok(self.current_receipt(key));
        }

        let (settled, reason) = match outcome {
            PaymentOutcome::Paid => (PaymentStatus::Completed, None),
            PaymentOutcome::Failed => (PaymentStatus::Failed, Some("payment failed at provider")),
            PaymentOutcome::Expired => (PaymentStatus::Expired, Some("invoice expired")),
            PaymentOutcome::Cancelled => {
                return Err(PaymentError::Validation(
                    "cancellation is decided by the order, not the provider".into(),
                ))
            }
        };
        self.status = Some(settled);
        self.failure_reason = reason.map(str::to_string);
        self.persist_best_effort(key, ctx).await;
        info!(payment_id = %key, status = %settled, "Payment settled");
        Ok(self.current_receipt(key))
    }

    async fn refund(
        &mut self,
        amount: f64,
        reason: String,
        inv: &Invocation<Self>,
        ctx: &PaymentContext,
    ) -> Result<RefundReceipt, PaymentError> {
        let key = inv.key();
        let status = self.status.ok_or_else(|| PaymentError::NotFound(key.clone()))?;

        if status == PaymentStatus::Refunded {
            if let Some(refund_id) = &self.refund_id {
                info!(payment_id = %key, %refund_id, "Payment already refunded");
                return Ok(RefundReceipt {
                    payment_id: key.clone(),
                    refund_id: refund_id.clone(),
                    amount: self.amount,
                });
            }
        }
        if status != PaymentStatus::Completed {
            return Err(PaymentError::StateConflict {
                payment_id: key.clone(),
                status,
                operation: "refund".into(),
            });
        }
        if amount.is_nan() {
            return Err(PaymentError::Validation("refund amount must be a number".into()));
        }
        let refunded = if amount <= 0.0 { self.amount } else { amount };
        if refunded > self.amount {
            return Err(PaymentError::Validation(format!(
                "refund {refunded:.2} exceeds payment {:.2}",
                self.amount
            )));
        }

        let refund_id = inv
            .run("refund", || async move { Ok(format!("refund_{}_{}", key, Utc::now().timestamp())) })
            .await?;

        self.status = Some(PaymentStatus::Refunded);
        self.refund_id = Some(refund_id.clone());
        self.persist_best_effort(key, ctx).await;
        info!(payment_id = %key, %refund_id, amount = refunded, %reason, "Payment refunded");
        Ok(RefundReceipt {
            payment_id: key.clone(),
            refund_id,
            amount: refunded,
        })
    }

    fn current_receipt(&self, key: &PaymentId) -> PaymentReceipt {
        PaymentReceipt {
            payment_id: key.clone(),
            status: self.status.unwrap_or(PaymentStatus::Pending),
            invoice_url: self.invoice_url.clone(),
            failure_reason: self.failure_reason.clone(),
        }
    }

    fn row(&self, key: &PaymentId) -> PaymentRow {
        PaymentRow {
            payment_id: key.clone(),
            order_id: self.order_id.clone(),
            amount: self.amount,
            method: self
                .method
                .as_ref()
                .map(PaymentMethod::as_str)
                .unwrap_or_default()
                .to_string(),
            status: self.status.unwrap_or(PaymentStatus::Pending),
            invoice_url: self.invoice_url.clone(),
            refund_id: self.refund_id.clone(),
        }
    }

    async fn persist_required(&self, step: &str, inv: &Invocation<Self>, ctx: &PaymentContext) -> Result<(), PaymentError> {
        let gateway = &ctx.gateway;
        let row = self.row(inv.key());
        let row = &row;
        inv.run(step, || async move { gateway.upsert_payment(row).await.map_err(StepError::from) })
            .await?;
        Ok(())
    }

    async fn persist_best_effort(&self, key: &PaymentId, ctx: &PaymentContext) {
        if let Err(e) = ctx.gateway.upsert_payment(&self.row(key)).await {
            warn!(entity_type = Self::KIND, %key, error = %e, "Payment status not persisted");
        }
    }
}

fn validate(order_id: &OrderId, amount: f64) -> Result<(), PaymentError> {
    if order_id.is_empty() {
        return Err(PaymentError::Validation("order_id is required".into()));
    }
    check_amount("amount", amount).map_err(PaymentError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaymentConfig;
    use crate::payment_actor::{PaymentProcessor, ScriptedProcessor};
    use crate::persistence::InMemoryGateway;
    use durable_actor::{RetryPolicy, Substrate};
    use std::sync::Arc;

    fn context(gateway: Arc<InMemoryGateway>, processor: Arc<dyn PaymentProcessor>) -> PaymentContext {
        PaymentContext {
            gateway,
            processor,
            settings: PaymentConfig::default(),
        }
    }

    fn invocation(attempts: u32) -> Invocation<Payment> {
        let substrate = Substrate::with_policies(RetryPolicy::immediate(attempts), RetryPolicy::none());
        Invocation::detached(PaymentId::from("pay_1"), substrate)
    }

    fn card() -> PaymentMethod {
        PaymentMethod::CreditCard {
            last_four: "4242".into(),
        }
    }

    async fn process(payment: &mut Payment, inv: &Invocation<Payment>, ctx: &PaymentContext) -> PaymentReceipt {
        let result = payment
            .handle_action(
                PaymentAction::ProcessPayment {
                    order_id: OrderId::from("ord_1"),
                    amount: 200.0,
                    method: card(),
                },
                inv,
                ctx,
            )
            .await
            .unwrap();
        match result {
            PaymentActionResult::ProcessPayment(receipt) => receipt,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_inside_the_charge_step() {
        let gateway = Arc::new(InMemoryGateway::new());
        let processor = Arc::new(ScriptedProcessor::failing_first(2));
        let ctx = context(gateway.clone(), processor.clone());
        let mut payment = Payment::default();

        let receipt = process(&mut payment, &invocation(5), &ctx).await;

        assert_eq!(receipt.status, PaymentStatus::Completed);
        assert_eq!(processor.attempts(), 3);
        assert_eq!(
            gateway.payment_history(&PaymentId::from("pay_1")),
            vec![PaymentStatus::Processing, PaymentStatus::Completed]
        );
    }

    #[tokio::test]
    async fn exhausted_retries_fail_the_payment() {
        let gateway = Arc::new(InMemoryGateway::new());
        let ctx = context(gateway, Arc::new(ScriptedProcessor::always_fail()));
        let mut payment = Payment::default();

        let receipt = process(&mut payment, &invocation(3), &ctx).await;

        assert_eq!(receipt.status, PaymentStatus::Failed);
        assert!(receipt.failure_reason.is_some());
    }

    #[tokio::test]
    async fn settled_payments_are_not_charged_again() {
        let processor = Arc::new(ScriptedProcessor::always_succeed());
        let ctx = context(Arc::new(InMemoryGateway::new()), processor.clone());
        let mut payment = Payment::default();

        let first = process(&mut payment, &invocation(3), &ctx).await;
        let second = process(&mut payment, &invocation(3), &ctx).await;

        assert_eq!(first, second);
        assert_eq!(processor.attempts(), 1);
    }

    #[tokio::test]
    async fn refund_requires_a_completed_payment() {
        let ctx = context(Arc::new(InMemoryGateway::new()), Arc::new(ScriptedProcessor::always_succeed()));
        let mut payment = Payment::default();
        let inv = invocation(1);
        payment
            .handle_action(
                PaymentAction::IssueInvoice {
                    order_id: OrderId::from("ord_1"),
                    amount: 10.0,
                },
                &inv,
                &ctx,
            )
            .await
            .unwrap();

        let err = payment
            .handle_action(
                PaymentAction::ProcessRefund {
                    amount: 0.0,
                    reason: "changed mind".into(),
                },
                &inv,
                &ctx,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::StateConflict { status: PaymentStatus::Pending, .. }));
    }

    #[tokio::test]
    async fn invoice_url_is_derived_from_the_payment_id() {
        let ctx = context(Arc::new(InMemoryGateway::new()), Arc::new(ScriptedProcessor::always_succeed()));
        let mut payment = Payment::default();

        let result = payment
            .handle_action(
                PaymentAction::IssueInvoice {
                    order_id: OrderId::from("ord_1"),
                    amount: 10.0,
                },
                &invocation(1),
                &ctx,
            )
            .await
            .unwrap();

        match result {
            PaymentActionResult::IssueInvoice(receipt) => {
                assert_eq!(receipt.status, PaymentStatus::Pending);
                assert_eq!(receipt.invoice_url.as_deref(), Some("https://example.test/invoices/pay_1"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
