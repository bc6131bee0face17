//! ActorEntity implementation for the order workflow.
//!
//! Calls to other actors go through [`Invocation::journaled`] so a replayed invocation does
//! not reserve stock or charge a card twice. Payment and shipment ids are derived from the
//! order id, which keeps their actors' own idempotency guards effective even when a client
//! repeats a whole checkout.

use super::actions::{OrderAction, OrderActionResult, OrderQuery, OrderQueryResult};
use super::error::OrderError;
use super::OrderContext;
use crate::config::FulfillmentMode;
use crate::error::check_quantity;
use crate::model::{
    CheckoutMode, CheckoutReceipt, ItemId, Order, OrderDetails, OrderId, OrderLine, OrderRequest, OrderStatus,
    PaymentId, PaymentOutcome, PaymentSignal, PaymentStatus, ShipmentId, ShipmentStatus,
};
use crate::persistence::{OrderLineRow, OrderRow};
use async_trait::async_trait;
use chrono::Utc;
use durable_actor::{ActorEntity, FrameworkError, Invocation, StepError};
use tracing::{debug, error, info, warn};

#[async_trait]
impl ActorEntity for Order {
    type Key = OrderId;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Query = OrderQuery;
    type QueryResult = OrderQueryResult;
    type Context = OrderContext;
    type Error = OrderError;
    const KIND: &'static str = "Order";

    async fn on_activate(&mut self, key: &OrderId, _ctx: &OrderContext) -> Result<(), OrderError> {
        self.order_id = key.clone();
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        inv: &Invocation<Self>,
        ctx: &OrderContext,
    ) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::Checkout(request) => self.checkout(request, inv, ctx).await.map(OrderActionResult::Checkout),
            OrderAction::AwaitPayment => self.await_payment(inv, ctx).await.map(OrderActionResult::Status),
            OrderAction::Ship => {
                self.expect_predecessor(inv.key(), OrderStatus::Shipped)?;
                self.dispatch(inv, ctx).await?;
                self.transition(OrderStatus::Shipped, inv, ctx).await?;
                Ok(OrderActionResult::Status(OrderStatus::Shipped))
            }
            OrderAction::Deliver => {
                self.expect_predecessor(inv.key(), OrderStatus::Delivered)?;
                self.move_shipment(ShipmentStatus::Delivered, "Customer", ctx).await;
                self.transition(OrderStatus::Delivered, inv, ctx).await?;
                Ok(OrderActionResult::Status(OrderStatus::Delivered))
            }
            OrderAction::Cancel { reason } => self.cancel(reason, inv, ctx).await.map(OrderActionResult::Status),
            OrderAction::Confirm => {
                self.transition(OrderStatus::Completed, inv, ctx).await?;
                Ok(OrderActionResult::Status(OrderStatus::Completed))
            }
            OrderAction::Return { reason } => {
                self.expect_predecessor(inv.key(), OrderStatus::Returned)?;
                if let Some(payment_id) = self.payment_id.clone() {
                    let refund = inv
                        .journaled("refund_payment", ctx.payments.process_refund(payment_id, 0.0, reason.clone()))
                        .await?;
                    self.refund_id = Some(refund.refund_id);
                }
                self.transition(OrderStatus::Returned, inv, ctx).await?;
                self.release_stock(inv, ctx).await;
                info!(order_id = %inv.key(), %reason, "Order returned");
                Ok(OrderActionResult::Status(OrderStatus::Returned))
            }
        }
    }

    async fn handle_query(
        &self,
        query: OrderQuery,
        key: &OrderId,
        ctx: &OrderContext,
    ) -> Result<OrderQueryResult, OrderError> {
        let status = self.status.ok_or_else(|| OrderError::NotFound(key.clone()))?;
        match query {
            OrderQuery::GetOrder => {
                let payment = match &self.payment_id {
                    Some(payment_id) => match ctx.payments.get_payment(payment_id.clone()).await {
                        Ok(payment) => payment.receipt(payment_id),
                        Err(e) => {
                            debug!(order_id = %key, %payment_id, error = %e, "Payment not available");
                            None
                        }
                    },
                    None => None,
                };
                let shipment = match &self.shipment_id {
                    Some(shipment_id) => match ctx.shipments.track_shipment(shipment_id.clone()).await {
                        Ok(info) => Some(info),
                        Err(e) => {
                            debug!(order_id = %key, %shipment_id, error = %e, "Shipment not available");
                            None
                        }
                    },
                    None => None,
                };

                Ok(OrderQueryResult::Details(Box::new(OrderDetails {
                    order_id: key.clone(),
                    customer_id: self.customer_id.clone(),
                    merchant_id: self.merchant_id.clone(),
                    status,
                    total_amount: self.total_amount,
                    lines: self.lines.clone(),
                    invoice_url: self.invoice_url.clone(),
                    cancellation_reason: self.cancellation_reason.clone(),
                    payment,
                    shipment,
                    created_at: self.created_at,
                    updated_at: self.updated_at,
                })))
            }
            OrderQuery::ContinuationToken => Ok(OrderQueryResult::ContinuationToken(self.continuation_token.clone())),
        }
    }
}

impl Order {
    async fn checkout(
        &mut self,
        request: OrderRequest,
        inv: &Invocation<Self>,
        ctx: &OrderContext,
    ) -> Result<CheckoutReceipt, OrderError> {
        let key = inv.key();
        if let Some(status) = self.status {
            info!(order_id = %key, %status, "Order already placed, returning current receipt");
            return Ok(self.receipt(key));
        }
        let wanted = merge_requests(&request)?;

        let mut lines = Vec::with_capacity(wanted.len());
        for (item_id, quantity) in wanted {
            let item = inv
                .journaled("get_item", ctx.inventory.get_item(request.merchant_id.clone(), item_id.clone()))
                .await?;
            if item.quantity < quantity {
                return Err(OrderError::InsufficientStock {
                    item_id,
                    requested: quantity,
                    available: item.quantity,
                });
            }
            lines.push(OrderLine {
                item_id,
                name: item.name,
                quantity,
                unit_price: item.price,
                subtotal: item.price * f64::from(quantity),
            });
        }

        self.order_id = key.clone();
        self.customer_id = request.customer_id.clone();
        self.merchant_id = request.merchant_id.clone();
        self.total_amount = lines.iter().map(|line| line.subtotal).sum();
        self.lines = lines;

        // All lines or none; the inventory actor re-checks stock under its own lock.
        inv.journaled("reserve_stock", ctx.inventory.reserve_stock(self.merchant_id.clone(), self.stock_lines()))
            .await?;

        let created_at = inv.run("created_at", || async { Ok(Utc::now()) }).await?;
        let payment_id = PaymentId::from(format!("pay_{key}"));
        let token = inv.awakeable::<PaymentSignal>()?;
        self.payment_id = Some(payment_id.clone());
        self.continuation_token = Some(token.id().clone());
        self.status = Some(OrderStatus::Pending);
        self.created_at = Some(created_at);
        self.updated_at = Some(created_at);

        if let Err(e) = self.persist_admission(inv, ctx).await {
            error!(order_id = %key, error = %e, "Order could not be persisted, releasing stock");
            self.release_stock(inv, ctx).await;
            *self = Order {
                order_id: key.clone(),
                ..Order::default()
            };
            return Err(e);
        }
        info!(
            order_id = %key,
            customer_id = %self.customer_id,
            merchant_id = %self.merchant_id,
            total_amount = self.total_amount,
            "Order admitted"
        );

        match request.mode {
            CheckoutMode::Invoice => {
                let issued = inv
                    .journaled("issue_invoice", ctx.payments.issue_invoice(payment_id, key.clone(), self.total_amount))
                    .await;
                let receipt = match issued {
                    Ok(receipt) => receipt,
                    Err(e) => {
                        let e = OrderError::from(e);
                        self.cancel_reserved(format!("invoice could not be issued: {e}"), inv, ctx)
                            .await?;
                        return Err(e);
                    }
                };
                self.invoice_url = receipt.invoice_url;
                self.persist_best_effort(ctx).await;
                inv.checkpoint(self)?;
                inv.enqueue_self(OrderAction::AwaitPayment)?;
                info!(order_id = %key, awakeable = %token.id(), "Order waiting for invoice payment");
                Ok(self.receipt(key))
            }
            CheckoutMode::Synchronous(method) => {
                inv.checkpoint(self)?;
                inv.sleep(ctx.settings.stage_delay()).await?;

                let charged = inv
                    .journaled(
                        "process_payment",
                        ctx.payments
                            .process_payment(payment_id.clone(), key.clone(), self.total_amount, method),
                    )
                    .await;
                let captured = matches!(&charged, Ok(receipt) if receipt.status == PaymentStatus::Completed);
                let outcome = match charged {
                    Ok(receipt) if receipt.status == PaymentStatus::Completed => PaymentOutcome::Paid,
                    Ok(receipt) => {
                        self.cancellation_reason = Some(
                            receipt
                                .failure_reason
                                .unwrap_or_else(|| format!("payment {}", receipt.status)),
                        );
                        PaymentOutcome::Failed
                    }
                    Err(e) => {
                        warn!(order_id = %key, error = %e, "Payment call failed");
                        self.cancellation_reason = Some(e.to_string());
                        PaymentOutcome::Failed
                    }
                };

                // The synchronous path is the invoice path with the token resolved at once.
                self.resolve_token(outcome.into(), inv)?;
                let signal = token.result().await?;
                let cancelled_meanwhile = captured && !signal.outcome.is_paid();
                self.finish(signal, inv, ctx).await?;
                if cancelled_meanwhile {
                    self.refund_captured(payment_id, inv, ctx).await;
                }
                Ok(self.receipt(key))
            }
        }
    }

    async fn await_payment(&mut self, inv: &Invocation<Self>, ctx: &OrderContext) -> Result<OrderStatus, OrderError> {
        let key = inv.key();
        let status = self.status.ok_or_else(|| OrderError::NotFound(key.clone()))?;
        let Some(token) = self.continuation_token.clone() else {
            return Ok(status);
        };
        if status != OrderStatus::Pending {
            debug!(order_id = %key, %status, "Order no longer waiting for payment");
            return Ok(status);
        }

        info!(order_id = %key, awakeable = %token, "Waiting for payment");
        let signal = inv.await_awakeable::<PaymentSignal>(&token)?.result().await?;
        info!(order_id = %key, outcome = ?signal.outcome, "Payment outcome received");
        self.finish(signal, inv, ctx).await?;
        Ok(self.status.unwrap_or(status))
    }

    /// Runs the order from PENDING to its next resting status once the payment outcome is known.
    async fn finish(&mut self, signal: PaymentSignal, inv: &Invocation<Self>, ctx: &OrderContext) -> Result<(), OrderError> {
        let PaymentSignal { outcome, reason } = signal;
        if !outcome.is_paid() {
            let reason = reason.or_else(|| self.cancellation_reason.clone()).unwrap_or_else(|| {
                match outcome {
                    PaymentOutcome::Expired => "invoice expired",
                    PaymentOutcome::Cancelled => "cancelled by request",
                    _ => "payment failed",
                }
                .to_string()
            });
            return self.cancel_reserved(reason, inv, ctx).await;
        }

        self.advance(OrderStatus::Processing, inv, ctx).await?;
        if ctx.settings.fulfillment_mode == FulfillmentMode::Manual {
            info!(order_id = %inv.key(), "Order waiting for manual shipment");
            return Ok(());
        }

        self.dispatch(inv, ctx).await?;
        self.advance(OrderStatus::Shipped, inv, ctx).await?;
        self.move_shipment(ShipmentStatus::Delivered, "Customer", ctx).await;
        self.advance(OrderStatus::Delivered, inv, ctx).await
    }

    async fn cancel(&mut self, reason: String, inv: &Invocation<Self>, ctx: &OrderContext) -> Result<OrderStatus, OrderError> {
        let key = inv.key();
        let status = self.status.ok_or_else(|| OrderError::NotFound(key.clone()))?;
        if status == OrderStatus::Cancelled {
            info!(order_id = %key, "Order already cancelled");
            return Ok(status);
        }
        self.expect_predecessor(key, OrderStatus::Cancelled)?;

        self.cancellation_reason = Some(reason.clone());
        self.transition(OrderStatus::Cancelled, inv, ctx).await?;
        self.resolve_token(PaymentSignal::cancelled(reason), inv)?;
        self.release_stock(inv, ctx).await;
        Ok(OrderStatus::Cancelled)
    }

    /// Cancels a PENDING order from inside the workflow and gives its stock back.
    async fn cancel_reserved(&mut self, reason: String, inv: &Invocation<Self>, ctx: &OrderContext) -> Result<(), OrderError> {
        if self.status == Some(OrderStatus::Cancelled) {
            return Ok(());
        }
        self.release_stock(inv, ctx).await;
        self.cancellation_reason = Some(reason);
        self.advance(OrderStatus::Cancelled, inv, ctx).await?;
        warn!(order_id = %inv.key(), reason = ?self.cancellation_reason, "Order cancelled");
        Ok(())
    }

    /// Creates the shipment (once) and marks it in transit.
    async fn dispatch(&mut self, inv: &Invocation<Self>, ctx: &OrderContext) -> Result<(), OrderError> {
        let key = inv.key();
        let shipment_id = self
            .shipment_id
            .clone()
            .unwrap_or_else(|| ShipmentId::from(format!("shp_{key}")));
        let receipt = inv
            .journaled(
                "create_shipment",
                ctx.shipments.create_shipment(shipment_id.clone(), key.clone(), None),
            )
            .await?;
        self.shipment_id = Some(shipment_id);
        self.tracking_number = Some(receipt.tracking_number);
        self.move_shipment(ShipmentStatus::InTransit, "In transit", ctx).await;
        Ok(())
    }

    async fn move_shipment(&self, status: ShipmentStatus, location: &str, ctx: &OrderContext) {
        let Some(shipment_id) = &self.shipment_id else {
            return;
        };
        if let Err(e) = ctx
            .shipments
            .update_status(shipment_id.clone(), status, location.to_string())
            .await
        {
            warn!(order_id = %self.order_id, %shipment_id, %status, error = %e, "Shipment status not updated");
        }
    }

    async fn release_stock(&self, inv: &Invocation<Self>, ctx: &OrderContext) {
        let released = inv
            .journaled("release_stock", ctx.inventory.release_stock(self.merchant_id.clone(), self.stock_lines()))
            .await;
        if let Err(e) = released {
            error!(order_id = %inv.key(), merchant_id = %self.merchant_id, error = %e, "Reserved stock not released");
        }
    }

    /// Gives back a charge that completed after the order was cancelled.
    async fn refund_captured(&mut self, payment_id: PaymentId, inv: &Invocation<Self>, ctx: &OrderContext) {
        let reason = self
            .cancellation_reason
            .clone()
            .unwrap_or_else(|| "order cancelled during payment".to_string());
        let refunded = inv
            .journaled("refund_payment", ctx.payments.process_refund(payment_id.clone(), 0.0, reason))
            .await;
        match refunded {
            Ok(refund) => {
                warn!(order_id = %inv.key(), %payment_id, refund_id = %refund.refund_id, "Charge for cancelled order refunded");
                self.refund_id = Some(refund.refund_id);
            }
            Err(e) => {
                error!(order_id = %inv.key(), %payment_id, error = %e, "Charge for cancelled order not refunded");
            }
        }
    }

    fn resolve_token(&self, signal: PaymentSignal, inv: &Invocation<Self>) -> Result<(), OrderError> {
        let Some(token) = &self.continuation_token else {
            return Ok(());
        };
        match inv.resolve_awakeable(token, &signal) {
            Ok(()) | Err(FrameworkError::AwakeableAlreadyResolved(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn expect_predecessor(&self, key: &OrderId, next: OrderStatus) -> Result<(), OrderError> {
        let current = self.status.ok_or_else(|| OrderError::NotFound(key.clone()))?;
        if !current.can_transition_to(next) {
            return Err(OrderError::StateConflict {
                order_id: key.clone(),
                from: current,
                to: next,
            });
        }
        Ok(())
    }

    /// Automatic progression: the status change is published for observers, persisted
    /// best-effort, and followed by the configured stage delay.
    async fn advance(&mut self, next: OrderStatus, inv: &Invocation<Self>, ctx: &OrderContext) -> Result<(), OrderError> {
        self.expect_predecessor(inv.key(), next)?;
        self.status = Some(next);
        self.updated_at = Some(Utc::now());
        self.persist_best_effort(ctx).await;
        inv.checkpoint(self)?;
        info!(order_id = %inv.key(), status = %next, "Order status changed");

        if !next.is_terminal() {
            inv.sleep(ctx.settings.stage_delay()).await?;
        }
        Ok(())
    }

    /// Manual transition: the new status is persisted before it is applied.
    async fn transition(&mut self, next: OrderStatus, inv: &Invocation<Self>, ctx: &OrderContext) -> Result<(), OrderError> {
        self.expect_predecessor(inv.key(), next)?;
        let mut updated = self.clone();
        updated.status = Some(next);
        updated.updated_at = Some(Utc::now());

        let gateway = &ctx.gateway;
        let row = updated.row();
        let row = &row;
        inv.run("persist_status", || async move { gateway.upsert_order(row).await.map_err(StepError::from) })
            .await?;

        *self = updated;
        info!(order_id = %inv.key(), status = %next, "Order status changed");
        Ok(())
    }

    async fn persist_admission(&self, inv: &Invocation<Self>, ctx: &OrderContext) -> Result<(), OrderError> {
        let gateway = &ctx.gateway;
        let order = self.row();
        let lines: Vec<OrderLineRow> = self
            .lines
            .iter()
            .map(|line| OrderLineRow::from_line(&self.order_id, &self.merchant_id, line))
            .collect();
        let (order, lines) = (&order, &lines);
        inv.run("persist_order", || async move {
            gateway.upsert_order(order).await.map_err(StepError::from)?;
            gateway.upsert_order_lines(lines).await.map_err(StepError::from)
        })
        .await?;
        Ok(())
    }

    async fn persist_best_effort(&self, ctx: &OrderContext) {
        if let Err(e) = ctx.gateway.upsert_order(&self.row()).await {
            warn!(entity_type = Self::KIND, key = %self.order_id, error = %e, "Order status not persisted");
        }
    }

    fn row(&self) -> OrderRow {
        OrderRow {
            order_id: self.order_id.clone(),
            customer_id: self.customer_id.clone(),
            merchant_id: self.merchant_id.clone(),
            status: self.status.unwrap_or(OrderStatus::Pending),
            total_amount: self.total_amount,
            payment_id: self.payment_id.clone(),
            shipment_id: self.shipment_id.clone(),
            tracking_number: self.tracking_number.clone(),
            continuation_token: self.continuation_token.as_ref().map(|token| token.to_string()),
            invoice_url: self.invoice_url.clone(),
        }
    }

    fn receipt(&self, key: &OrderId) -> CheckoutReceipt {
        CheckoutReceipt {
            order_id: key.clone(),
            status: self.status.unwrap_or(OrderStatus::Pending),
            total_amount: self.total_amount,
            payment_id: self.payment_id.clone(),
            invoice_url: self.invoice_url.clone(),
            tracking_number: self.tracking_number.clone(),
        }
    }
}

/// Validates the request and folds duplicate items into one line each.
fn merge_requests(request: &OrderRequest) -> Result<Vec<(ItemId, u32)>, OrderError> {
    if request.customer_id.is_empty() {
        return Err(OrderError::Validation("customer_id is required".into()));
    }
    if request.merchant_id.is_empty() {
        return Err(OrderError::Validation("merchant_id is required".into()));
    }
    if request.items.is_empty() {
        return Err(OrderError::Validation("at least one item is required".into()));
    }

    let mut merged: Vec<(ItemId, u32)> = Vec::with_capacity(request.items.len());
    for item in &request.items {
        if item.item_id.is_empty() {
            return Err(OrderError::Validation("item_id is required".into()));
        }
        let quantity = check_quantity("quantity", item.quantity).map_err(OrderError::Validation)?;
        if quantity == 0 {
            return Err(OrderError::Validation(format!("quantity for {} must be positive", item.item_id)));
        }
        match merged.iter_mut().find(|(id, _)| *id == item.item_id) {
            Some((_, total)) => {
                *total = total
                    .checked_add(quantity)
                    .ok_or_else(|| OrderError::Validation(format!("quantity for {} is too large", item.item_id)))?;
            }
            None => merged.push((item.item_id.clone(), quantity)),
        }
    }
    Ok(merged)
}
