//! End-to-end tests against a fully wired [`FulfillmentSystem`].
//!
//! Every test starts its own system on an [`InMemoryGateway`] so rows written by one
//! scenario never leak into another. Payment attempts are scripted instead of random.

use order_fulfillment::config::{FulfillmentConfig, FulfillmentMode};
use order_fulfillment::error::ErrorKind;
use order_fulfillment::lifecycle::FulfillmentSystem;
use order_fulfillment::model::{
    CheckoutMode, CustomerId, ItemDraft, ItemId, ItemRequest, MerchantId, MerchantItem, OrderDetails, OrderId,
    OrderRequest, OrderStatus, PaymentId, PaymentMethod, PaymentStatus, ShipmentStatus, StockUpdate,
};
use order_fulfillment::clients::WebhookOutcome;
use order_fulfillment::payment_actor::{PaymentProcessor, ScriptedProcessor};
use order_fulfillment::persistence::{InMemoryGateway, PersistenceGateway};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn merchant() -> MerchantId {
    MerchantId::from("m_001")
}

fn customer() -> CustomerId {
    CustomerId::from("cust_001")
}

fn card() -> CheckoutMode {
    CheckoutMode::Synchronous(PaymentMethod::CreditCard {
        last_four: "4242".into(),
    })
}

fn request(quantity: i64, mode: CheckoutMode) -> OrderRequest {
    OrderRequest {
        customer_id: customer(),
        merchant_id: merchant(),
        items: vec![ItemRequest::new("i_001", quantity)],
        mode,
    }
}

fn start(config: FulfillmentConfig, processor: impl PaymentProcessor + 'static) -> (FulfillmentSystem, Arc<InMemoryGateway>) {
    let gateway = Arc::new(InMemoryGateway::new());
    let system = FulfillmentSystem::start(config, gateway.clone(), Arc::new(processor)).expect("valid test config");
    (system, gateway)
}

fn start_default() -> (FulfillmentSystem, Arc<InMemoryGateway>) {
    start(FulfillmentConfig::for_test(), ScriptedProcessor::always_succeed())
}

/// Adds the widget used by most scenarios: i_001 at 100.00 with the given stock.
async fn stock_widget(system: &FulfillmentSystem, quantity: i64) {
    system
        .inventory
        .add_item(merchant(), ItemDraft::new("i_001", "Widget", "A widget", 100.0, quantity))
        .await
        .expect("widget added");
}

async fn widget_stock(system: &FulfillmentSystem) -> u32 {
    system
        .inventory
        .get_item(merchant(), ItemId::from("i_001"))
        .await
        .expect("widget exists")
        .quantity
}

/// Polls GetOrder until the order reaches `status`. Invoice orders resume in the
/// background after the webhook returns.
async fn wait_for_status(system: &FulfillmentSystem, order_id: &OrderId, status: OrderStatus) -> OrderDetails {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let details = system.orders.get_order(order_id.clone()).await.expect("order exists");
            if details.status == status {
                return details;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("order {order_id} never reached {status}"))
}

/// A paid card order runs straight through to DELIVERED, deducting stock once and
/// persisting the order, its payment and its shipment.
#[tokio::test]
async fn card_order_runs_to_delivered() {
    let (system, gateway) = start_default();
    stock_widget(&system, 50).await;

    let receipt = system.orders.create_order(request(2, card())).await.unwrap();

    assert_eq!(receipt.status, OrderStatus::Delivered);
    assert_eq!(receipt.total_amount, 200.0);
    assert!(receipt.tracking_number.as_deref().is_some_and(|t| t.starts_with("TRACK-")));
    assert_eq!(widget_stock(&system).await, 48);

    let details = system.orders.get_order(receipt.order_id.clone()).await.unwrap();
    assert_eq!(details.lines.len(), 1);
    assert_eq!(details.lines[0].subtotal, 200.0);
    assert_eq!(details.payment.map(|p| p.status), Some(PaymentStatus::Completed));
    let shipment = details.shipment.expect("shipment attached");
    assert_eq!(shipment.status, ShipmentStatus::Delivered);
    assert_eq!(shipment.current_location, "Customer");

    let row = gateway.get_order(&receipt.order_id).await.unwrap().expect("order row");
    assert_eq!(row.row.status, OrderStatus::Delivered);
    assert_eq!(
        gateway.order_history(&receipt.order_id),
        vec![OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered]
    );
    assert_eq!(gateway.order_lines(&receipt.order_id).await.unwrap().len(), 1);
    assert_eq!(gateway.payment_rows_for_order(&receipt.order_id), 1);
    assert_eq!(gateway.shipment_rows_for_order(&receipt.order_id), 1);

    system.shutdown().await.unwrap();
}

/// Placing the same order id twice returns the first receipt and reserves stock once.
#[tokio::test]
async fn repeated_checkout_is_idempotent() {
    let (system, gateway) = start_default();
    stock_widget(&system, 50).await;
    let order_id = OrderId::from("ord_repeat");

    let first = system.orders.place_order(order_id.clone(), request(2, card())).await.unwrap();
    let second = system.orders.place_order(order_id.clone(), request(2, card())).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(widget_stock(&system).await, 48);
    assert_eq!(gateway.payment_rows_for_order(&order_id), 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn insufficient_stock_rejects_the_order() {
    let (system, _gateway) = start_default();
    stock_widget(&system, 1).await;

    let err = assert_err!(system.orders.create_order(request(2, card())).await);

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(widget_stock(&system).await, 1);

    system.shutdown().await.unwrap();
}

/// Offset tokens chain through the catalog; the last page carries an empty token.
#[tokio::test]
async fn list_items_pages_by_offset_token() {
    let (system, _gateway) = start_default();
    for n in 1..=5 {
        system
            .inventory
            .add_item(merchant(), ItemDraft::new(format!("i_00{n}"), format!("Item {n}"), "", 1.0, 10))
            .await
            .unwrap();
    }

    let mut token = String::new();
    let mut sizes = Vec::new();
    let mut tokens = Vec::new();
    loop {
        let page = system.inventory.list_items(merchant(), 2, token).await.unwrap();
        sizes.push(page.items.len());
        tokens.push(page.next_page_token.clone());
        if page.next_page_token.is_empty() {
            break;
        }
        token = page.next_page_token;
    }

    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(tokens, vec!["2", "4", ""]);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn stock_update_floors_at_zero() {
    let (system, _gateway) = start_default();
    stock_widget(&system, 10).await;

    let item = system
        .inventory
        .update_stock(merchant(), ItemId::from("i_001"), StockUpdate::Set(-5))
        .await
        .unwrap();
    assert_eq!(item.quantity, 0);

    let item = system
        .inventory
        .update_stock(merchant(), ItemId::from("i_001"), StockUpdate::Increment(3))
        .await
        .unwrap();
    assert_eq!(item.quantity, 3);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn added_item_reads_back_unchanged() {
    let (system, _gateway) = start_default();

    let added = system
        .inventory
        .add_item(merchant(), ItemDraft::new("i_042", "Gadget", "Shiny", 12.5, 7))
        .await
        .unwrap();
    let fetched = system.inventory.get_item(merchant(), ItemId::from("i_042")).await.unwrap();

    assert_eq!(added, fetched);
    assert_eq!(fetched.price, 12.5);
    assert_eq!(fetched.quantity, 7);

    system.shutdown().await.unwrap();
}

/// A cart holds items of one merchant; adding another merchant's item leaves it as it was.
#[tokio::test]
async fn cart_rejects_a_second_merchant() {
    let (system, _gateway) = start_default();
    stock_widget(&system, 50).await;
    system
        .inventory
        .add_item(MerchantId::from("m_002"), ItemDraft::new("i_900", "Other", "", 5.0, 5))
        .await
        .unwrap();

    system
        .carts
        .add_to_cart(customer(), merchant(), vec![ItemRequest::new("i_001", 1)])
        .await
        .unwrap();
    let err = system
        .carts
        .add_to_cart(customer(), MerchantId::from("m_002"), vec![ItemRequest::new("i_900", 1)])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    let cart = system.carts.view_cart(customer()).await.unwrap();
    assert_eq!(cart.merchant_id, Some(merchant()));
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_amount, 100.0);

    system.shutdown().await.unwrap();
}

/// Invoice checkout returns PENDING at once and finishes after the provider reports PAID.
#[tokio::test]
async fn invoice_order_resumes_on_payment_webhook() {
    let (system, _gateway) = start_default();
    stock_widget(&system, 50).await;

    let receipt = system.orders.create_order(request(2, CheckoutMode::Invoice)).await.unwrap();
    assert_eq!(receipt.status, OrderStatus::Pending);
    let payment_id = receipt.payment_id.clone().expect("payment id assigned");
    assert!(receipt.invoice_url.as_deref().is_some_and(|url| url.ends_with(payment_id.as_str())));
    assert_eq!(widget_stock(&system).await, 48);

    let ignored = system.orders.on_payment_update(payment_id.clone(), "PENDING".into()).await.unwrap();
    assert_eq!(ignored, WebhookOutcome::Ignored);

    let outcome = system.orders.on_payment_update(payment_id.clone(), "PAID".into()).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Resumed(receipt.order_id.clone()));

    let details = wait_for_status(&system, &receipt.order_id, OrderStatus::Delivered).await;
    assert_eq!(details.payment.map(|p| p.status), Some(PaymentStatus::Completed));

    let repeat = system.orders.on_payment_update(payment_id, "PAID".into()).await.unwrap();
    assert_eq!(repeat, WebhookOutcome::Duplicate(receipt.order_id));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn expired_invoice_cancels_and_restores_stock() {
    let (system, _gateway) = start_default();
    stock_widget(&system, 50).await;

    let receipt = system.orders.create_order(request(5, CheckoutMode::Invoice)).await.unwrap();
    let payment_id = receipt.payment_id.clone().unwrap();
    system.orders.on_payment_update(payment_id, "EXPIRED".into()).await.unwrap();

    let details = wait_for_status(&system, &receipt.order_id, OrderStatus::Cancelled).await;
    assert_eq!(details.payment.map(|p| p.status), Some(PaymentStatus::Expired));
    assert_eq!(widget_stock(&system).await, 50);

    system.shutdown().await.unwrap();
}

/// Cancelling an order parked on its invoice wakes it, gives the stock back, and a payment
/// that arrives afterwards is refunded.
#[tokio::test]
async fn cancelled_invoice_order_refunds_late_payment() {
    let (system, gateway) = start_default();
    stock_widget(&system, 50).await;

    let receipt = system.orders.create_order(request(2, CheckoutMode::Invoice)).await.unwrap();
    let status = assert_ok!(
        system
            .orders
            .cancel_order(receipt.order_id.clone(), "changed my mind".into())
            .await
    );
    assert_eq!(status, OrderStatus::Cancelled);
    assert_eq!(widget_stock(&system).await, 50);
    let details = system.orders.get_order(receipt.order_id.clone()).await.unwrap();
    assert_eq!(details.cancellation_reason.as_deref(), Some("changed my mind"));
    // The invoice stays open so a late capture can still be matched and refunded.
    assert_eq!(details.payment.map(|p| p.status), Some(PaymentStatus::Pending));
    assert_eq!(
        gateway.order_history(&receipt.order_id),
        vec![OrderStatus::Pending, OrderStatus::Cancelled]
    );

    // Cancelling again is a no-op.
    let again = system.orders.cancel_order(receipt.order_id.clone(), "again".into()).await.unwrap();
    assert_eq!(again, OrderStatus::Cancelled);

    let payment_id = receipt.payment_id.clone().unwrap();
    let outcome = system.orders.on_payment_update(payment_id.clone(), "PAID".into()).await.unwrap();
    match outcome {
        WebhookOutcome::Refunded(refund) => {
            assert_eq!(refund.payment_id, payment_id);
            assert_eq!(refund.amount, 200.0);
        }
        other => panic!("expected a refund, got {other:?}"),
    }
    let payment = system.payments.get_payment(payment_id).await.unwrap();
    assert_eq!(payment.status, Some(PaymentStatus::Refunded));
    assert_eq!(widget_stock(&system).await, 50);

    system.shutdown().await.unwrap();
}

/// Declines past the retry budget cancel the order and give its stock back.
#[tokio::test]
async fn exhausted_payment_cancels_and_restores_stock() {
    let (system, gateway) = start(FulfillmentConfig::for_test(), ScriptedProcessor::always_fail());
    stock_widget(&system, 50).await;

    let receipt = system.orders.create_order(request(2, card())).await.unwrap();

    assert_eq!(receipt.status, OrderStatus::Cancelled);
    assert_eq!(receipt.tracking_number, None);
    assert_eq!(widget_stock(&system).await, 50);
    let details = system.orders.get_order(receipt.order_id.clone()).await.unwrap();
    assert!(details.cancellation_reason.is_some());
    assert_eq!(details.payment.map(|p| p.status), Some(PaymentStatus::Failed));
    assert_eq!(gateway.shipment_rows_for_order(&receipt.order_id), 0);
    assert_eq!(
        gateway.order_history(&receipt.order_id),
        vec![OrderStatus::Pending, OrderStatus::Cancelled]
    );

    system.shutdown().await.unwrap();
}

/// A cancellation that lands while a card charge is still in flight wins: the order ends
/// CANCELLED with the caller's reason, the stock comes back and the charge is refunded.
#[tokio::test]
async fn cancel_during_card_checkout_refunds_the_charge() {
    let mut config = FulfillmentConfig::for_test();
    config.workflow.stage_delay_ms = 300;
    let (system, gateway) = start(config, ScriptedProcessor::always_succeed());
    stock_widget(&system, 50).await;
    let order_id = OrderId::from("ord_race");

    let checkout = tokio::spawn({
        let orders = system.orders.clone();
        let order_id = order_id.clone();
        async move { orders.place_order(order_id, request(2, card())).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    let status = assert_ok!(system.orders.cancel_order(order_id.clone(), "changed my mind".into()).await);
    let receipt = checkout.await.unwrap().unwrap();

    assert_eq!(status, OrderStatus::Cancelled);
    assert_eq!(receipt.status, OrderStatus::Cancelled);
    assert_eq!(receipt.tracking_number, None);
    assert_eq!(widget_stock(&system).await, 50);
    let details = system.orders.get_order(order_id.clone()).await.unwrap();
    assert_eq!(details.cancellation_reason.as_deref(), Some("changed my mind"));
    assert_eq!(details.payment.map(|p| p.status), Some(PaymentStatus::Refunded));
    assert_eq!(gateway.shipment_rows_for_order(&order_id), 0);
    assert_eq!(gateway.order_history(&order_id), vec![OrderStatus::Pending, OrderStatus::Cancelled]);

    system.shutdown().await.unwrap();
}

/// A single declined attempt is retried and the order still completes.
#[tokio::test]
async fn transient_decline_is_retried() {
    let (system, gateway) = start(FulfillmentConfig::for_test(), ScriptedProcessor::failing_first(1));
    stock_widget(&system, 50).await;

    let receipt = system.orders.create_order(request(1, card())).await.unwrap();

    assert_eq!(receipt.status, OrderStatus::Delivered);
    let payment_id = receipt.payment_id.unwrap();
    assert_eq!(
        gateway.payment_history(&payment_id),
        vec![PaymentStatus::Processing, PaymentStatus::Completed]
    );

    system.shutdown().await.unwrap();
}

/// When the order row cannot be written, admission fails and the reservation is undone.
#[tokio::test]
async fn persistence_outage_aborts_admission() {
    let (system, gateway) = start_default();
    stock_widget(&system, 50).await;
    let order_id = OrderId::from("ord_outage");

    gateway.set_unavailable(true);
    let err = system.orders.place_order(order_id.clone(), request(2, card())).await.unwrap_err();
    gateway.set_unavailable(false);

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(widget_stock(&system).await, 50);
    assert_eq!(gateway.payment_rows_for_order(&order_id), 0);
    let lookup = system.orders.get_order(order_id).await.unwrap_err();
    assert_eq!(lookup.kind(), ErrorKind::NotFound);

    system.shutdown().await.unwrap();
}

/// With manual fulfillment the order stops at PROCESSING and operators move it on.
#[tokio::test]
async fn manual_mode_waits_for_operators() {
    let mut config = FulfillmentConfig::for_test();
    config.workflow.fulfillment_mode = FulfillmentMode::Manual;
    let (system, _gateway) = start(config, ScriptedProcessor::always_succeed());
    stock_widget(&system, 50).await;

    let receipt = system.orders.create_order(request(1, card())).await.unwrap();
    assert_eq!(receipt.status, OrderStatus::Processing);
    let order_id = receipt.order_id;

    let early = system.orders.deliver_order(order_id.clone()).await.unwrap_err();
    assert_eq!(early.kind(), ErrorKind::StateConflict);

    assert_eq!(system.orders.ship_order(order_id.clone()).await.unwrap(), OrderStatus::Shipped);
    let details = system.orders.get_order(order_id.clone()).await.unwrap();
    assert_eq!(details.shipment.map(|s| s.status), Some(ShipmentStatus::InTransit));

    assert_eq!(system.orders.deliver_order(order_id.clone()).await.unwrap(), OrderStatus::Delivered);
    assert_eq!(system.orders.confirm_order(order_id.clone()).await.unwrap(), OrderStatus::Completed);

    let late = system.orders.cancel_order(order_id, "too late".into()).await.unwrap_err();
    assert_eq!(late.kind(), ErrorKind::StateConflict);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn returned_order_is_refunded_and_restocked() {
    let (system, _gateway) = start_default();
    stock_widget(&system, 50).await;
    let receipt = system.orders.create_order(request(2, card())).await.unwrap();
    assert_eq!(widget_stock(&system).await, 48);

    let status = system
        .orders
        .return_order(receipt.order_id.clone(), "damaged".into())
        .await
        .unwrap();

    assert_eq!(status, OrderStatus::Returned);
    assert_eq!(widget_stock(&system).await, 50);
    let details = system.orders.get_order(receipt.order_id).await.unwrap();
    assert_eq!(details.payment.map(|p| p.status), Some(PaymentStatus::Refunded));

    system.shutdown().await.unwrap();
}

/// A fresh system reads the catalog written by an earlier one.
#[tokio::test]
async fn cold_start_hydrates_the_catalog() {
    let gateway = Arc::new(InMemoryGateway::new());
    let stored = MerchantItem {
        item_id: ItemId::from("i_001"),
        name: "Widget".into(),
        description: "From storage".into(),
        price: 100.0,
        quantity: 9,
    };
    gateway.upsert_merchant_item(&merchant(), &stored).await.unwrap();

    let system = FulfillmentSystem::start(
        FulfillmentConfig::for_test(),
        gateway.clone(),
        Arc::new(ScriptedProcessor::always_succeed()),
    )
    .unwrap();

    let item = system.inventory.get_item(merchant(), ItemId::from("i_001")).await.unwrap();
    assert_eq!(item, stored);

    let receipt = system.orders.create_order(request(4, card())).await.unwrap();
    assert_eq!(receipt.status, OrderStatus::Delivered);
    assert_eq!(widget_stock(&system).await, 5);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn cart_checkout_places_the_order_and_empties_the_cart() {
    let (system, _gateway) = start_default();
    stock_widget(&system, 50).await;
    system
        .carts
        .add_to_cart(customer(), merchant(), vec![ItemRequest::new("i_001", 2)])
        .await
        .unwrap();
    system
        .carts
        .add_to_cart(customer(), merchant(), vec![ItemRequest::new("i_001", 1)])
        .await
        .unwrap();

    let receipt = system.orders.checkout_cart(customer(), card()).await.unwrap();

    assert_eq!(receipt.status, OrderStatus::Delivered);
    assert_eq!(receipt.total_amount, 300.0);
    assert_eq!(widget_stock(&system).await, 47);
    let cart = system.carts.view_cart(customer()).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.merchant_id, None);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn list_orders_filters_by_customer_newest_first() {
    let (system, _gateway) = start_default();
    stock_widget(&system, 50).await;

    let first = system.orders.create_order(request(1, card())).await.unwrap();
    let second = system.orders.create_order(request(1, CheckoutMode::Invoice)).await.unwrap();
    let mut other = request(1, card());
    other.customer_id = CustomerId::from("cust_002");
    system.orders.create_order(other).await.unwrap();

    let mine = system.orders.list_orders(Some(customer())).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|summary| summary.customer_id == customer()));
    assert!(mine[0].updated_at >= mine[1].updated_at);
    let ids: Vec<_> = mine.iter().map(|summary| summary.order_id.clone()).collect();
    assert!(ids.contains(&first.order_id) && ids.contains(&second.order_id));

    let everyone = system.orders.list_orders(None).await.unwrap();
    assert_eq!(everyone.len(), 3);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn unknown_payment_reference_is_not_found() {
    let (system, _gateway) = start_default();

    let err = system
        .orders
        .on_payment_update(PaymentId::from("pay_missing"), "PAID".into())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);

    system.shutdown().await.unwrap();
}
