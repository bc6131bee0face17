//! # Order Client
//!
//! The public surface of the fulfillment core: order placement, manual transitions, the
//! payment-provider webhook, cart checkout and the order list view.
//!
//! A parked invoice order occupies its key's queue until its continuation token is
//! resolved, so operations that must reach a parked order (cancellation, payment
//! notifications) resolve the token through the [`Substrate`] first.
use super::{CartClient, PaymentClient};
use crate::model::{
    CheckoutMode, CheckoutReceipt, CustomerId, Order, OrderDetails, OrderId, OrderRequest, OrderStatus, OrderSummary,
    PaymentId, PaymentOutcome, PaymentSignal, RefundReceipt,
};
use crate::order_workflow::{OrderAction, OrderActionResult, OrderError, OrderQuery, OrderQueryResult};
use crate::persistence::SharedGateway;
use crate::error::ErrorKind;
use async_trait::async_trait;
use durable_actor::{ActorClient, AwakeableId, FrameworkError, ResourceClient, Substrate};
use std::fmt::Debug;
use tracing::{debug, info, instrument, warn};

/// What a payment notification did.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// The provider status is not final; nothing changed.
    Ignored,
    /// The parked order was woken with the outcome.
    Resumed(OrderId),
    /// The order had already moved on; the notification was a repeat.
    Duplicate(OrderId),
    /// Payment arrived for an order that was cancelled meanwhile, so it was refunded.
    Refunded(RefundReceipt),
}

/// Client for interacting with the order workflow.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    carts: CartClient,
    payments: PaymentClient,
    substrate: Substrate,
    gateway: SharedGateway,
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        OrderError::ActorCommunicationError(e.to_string())
    }
}

fn unexpected(response: impl Debug) -> OrderError {
    OrderError::ActorCommunicationError(format!("unexpected response: {response:?}"))
}

impl OrderClient {
    pub fn new(
        inner: ResourceClient<Order>,
        carts: CartClient,
        payments: PaymentClient,
        substrate: Substrate,
        gateway: SharedGateway,
    ) -> Self {
        Self {
            inner,
            carts,
            payments,
            substrate,
            gateway,
        }
    }

    async fn act(&self, order_id: OrderId, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        debug!("Sending request");
        self.inner
            .perform_action(order_id, action)
            .await
            .map_err(Self::lift_error)
    }

    async fn transition(&self, order_id: OrderId, action: OrderAction) -> Result<OrderStatus, OrderError> {
        match self.act(order_id, action).await? {
            OrderActionResult::Status(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    async fn continuation_token(&self, order_id: OrderId) -> Result<Option<AwakeableId>, OrderError> {
        match self
            .inner
            .query(order_id, OrderQuery::ContinuationToken)
            .await
            .map_err(Self::lift_error)?
        {
            OrderQueryResult::ContinuationToken(token) => Ok(token),
            other => Err(unexpected(other)),
        }
    }

    /// Places an order under a fresh order id.
    pub async fn create_order(&self, request: OrderRequest) -> Result<CheckoutReceipt, OrderError> {
        self.place_order(OrderId::generate(), request).await
    }

    /// Places an order under a caller-chosen id. Repeating the call returns the receipt of
    /// the order already placed.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, merchant_id = %request.merchant_id))]
    pub async fn place_order(&self, order_id: OrderId, request: OrderRequest) -> Result<CheckoutReceipt, OrderError> {
        match self.act(order_id, OrderAction::Checkout(request)).await? {
            OrderActionResult::Checkout(receipt) => Ok(receipt),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails, OrderError> {
        debug!("Sending request");
        match self
            .inner
            .query(order_id, OrderQuery::GetOrder)
            .await
            .map_err(Self::lift_error)?
        {
            OrderQueryResult::Details(details) => Ok(*details),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn ship_order(&self, order_id: OrderId) -> Result<OrderStatus, OrderError> {
        self.transition(order_id, OrderAction::Ship).await
    }

    #[instrument(skip(self))]
    pub async fn deliver_order(&self, order_id: OrderId) -> Result<OrderStatus, OrderError> {
        self.transition(order_id, OrderAction::Deliver).await
    }

    #[instrument(skip(self))]
    pub async fn confirm_order(&self, order_id: OrderId) -> Result<OrderStatus, OrderError> {
        self.transition(order_id, OrderAction::Confirm).await
    }

    #[instrument(skip(self))]
    pub async fn return_order(&self, order_id: OrderId, reason: String) -> Result<OrderStatus, OrderError> {
        self.transition(order_id, OrderAction::Return { reason }).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId, reason: String) -> Result<OrderStatus, OrderError> {
        if let Some(token) = self.continuation_token(order_id.clone()).await? {
            match self.substrate.resolve_awakeable(&token, &PaymentSignal::cancelled(reason.clone())) {
                Ok(()) => info!(%order_id, "Parked order woken for cancellation"),
                Err(FrameworkError::AwakeableAlreadyResolved(_)) => {}
                Err(e) => return Err(Self::map_error(e)),
            }
        }
        self.transition(order_id, OrderAction::Cancel { reason }).await
    }

    /// Handles a payment provider notification. `external_reference` is the payment id the
    /// invoice was issued under.
    #[instrument(skip(self))]
    pub async fn on_payment_update(
        &self,
        external_reference: PaymentId,
        provider_status: String,
    ) -> Result<WebhookOutcome, OrderError> {
        let Some(outcome) = PaymentOutcome::from_provider_status(&provider_status) else {
            info!(payment_id = %external_reference, %provider_status, "Payment still pending, notification ignored");
            return Ok(WebhookOutcome::Ignored);
        };

        let order_id = self
            .gateway
            .find_order_by_payment(&external_reference)
            .await
            .map_err(|e| OrderError::Persistence(e.to_string()))?
            .ok_or_else(|| OrderError::Dependency {
                service: "payment",
                kind: ErrorKind::NotFound,
                message: format!("no order for payment {external_reference}"),
            })?;

        self.payments.settle_payment(external_reference.clone(), outcome).await?;

        let Some(token) = self.continuation_token(order_id.clone()).await? else {
            return Ok(WebhookOutcome::Ignored);
        };
        match self.substrate.resolve_awakeable(&token, &PaymentSignal::from(outcome)) {
            Ok(()) => {
                info!(%order_id, ?outcome, "Order resumed by payment notification");
                Ok(WebhookOutcome::Resumed(order_id))
            }
            Err(FrameworkError::AwakeableAlreadyResolved(_)) => {
                let details = self.get_order(order_id.clone()).await?;
                if outcome.is_paid() && details.status == OrderStatus::Cancelled {
                    let refund = self
                        .payments
                        .process_refund(external_reference, 0.0, "order cancelled before payment".into())
                        .await?;
                    warn!(%order_id, refund_id = %refund.refund_id, "Payment for cancelled order refunded");
                    Ok(WebhookOutcome::Refunded(refund))
                } else {
                    debug!(%order_id, status = %details.status, "Repeated payment notification");
                    Ok(WebhookOutcome::Duplicate(order_id))
                }
            }
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Places an order from the customer's cart and empties the cart unless the order ends
    /// up cancelled.
    #[instrument(skip(self))]
    pub async fn checkout_cart(&self, customer_id: CustomerId, mode: CheckoutMode) -> Result<CheckoutReceipt, OrderError> {
        let cart = self.carts.view_cart(customer_id.clone()).await?;
        let merchant_id = match &cart.merchant_id {
            Some(merchant_id) if !cart.is_empty() => merchant_id.clone(),
            _ => return Err(OrderError::Validation("cart is empty".into())),
        };

        let receipt = self
            .create_order(OrderRequest {
                customer_id: customer_id.clone(),
                merchant_id,
                items: cart.as_requests(),
                mode,
            })
            .await?;

        if receipt.status != OrderStatus::Cancelled {
            if let Err(e) = self.carts.clear_cart(customer_id.clone()).await {
                warn!(%customer_id, order_id = %receipt.order_id, error = %e, "Cart not cleared after checkout");
            }
        }
        Ok(receipt)
    }

    /// Orders newest first, read from the persistence gateway.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, customer_id: Option<CustomerId>) -> Result<Vec<OrderSummary>, OrderError> {
        let rows = self
            .gateway
            .list_orders(customer_id.as_ref())
            .await
            .map_err(|e| OrderError::Persistence(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|stamped| OrderSummary {
                order_id: stamped.row.order_id,
                customer_id: stamped.row.customer_id,
                merchant_id: stamped.row.merchant_id,
                status: stamped.row.status,
                total_amount: stamped.row.total_amount,
                updated_at: stamped.updated_at,
            })
            .collect())
    }
}
