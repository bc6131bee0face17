//! Order workflow tests: a real Order actor with mocked inventory, payment and shipment
//! actors, so each test states exactly which downstream calls the workflow makes.

use durable_actor::mock::MockClient;
use durable_actor::{ActorClient, RetryPolicy, Substrate};
use order_fulfillment::clients::{CartClient, InventoryClient, OrderClient, PaymentClient, ShipmentClient};
use order_fulfillment::config::WorkflowConfig;
use order_fulfillment::inventory_actor::{InventoryAction, InventoryActionResult, InventoryQueryResult};
use order_fulfillment::model::{
    Cart, CheckoutMode, CustomerId, ItemId, ItemRequest, MerchantId, MerchantInventory, MerchantItem, OrderId,
    OrderRequest, OrderStatus, Payment, PaymentId, PaymentMethod, PaymentReceipt, PaymentStatus, Shipment,
    ShipmentId, ShipmentReceipt, ShipmentStatus, TrackingInfo,
};
use order_fulfillment::order_workflow::{self, OrderContext};
use order_fulfillment::payment_actor::{PaymentAction, PaymentActionResult};
use order_fulfillment::persistence::{InMemoryGateway, PersistenceGateway};
use order_fulfillment::shipment_actor::{ShipmentAction, ShipmentActionResult};
use std::sync::Arc;

struct Deps {
    inventory: MockClient<MerchantInventory>,
    payments: MockClient<Payment>,
    shipments: MockClient<Shipment>,
    carts: MockClient<Cart>,
    gateway: Arc<InMemoryGateway>,
}

impl Deps {
    fn new() -> Self {
        Self {
            inventory: MockClient::new(),
            payments: MockClient::new(),
            shipments: MockClient::new(),
            carts: MockClient::new(),
            gateway: Arc::new(InMemoryGateway::new()),
        }
    }

    /// Spawns the Order actor wired to the mocks.
    fn spawn(&self) -> (OrderClient, tokio::task::JoinHandle<()>) {
        let substrate = Substrate::with_policies(RetryPolicy::immediate(2), RetryPolicy::none());
        let (actor, client) = order_workflow::new(10, substrate.clone());
        let handle = tokio::spawn(actor.run(OrderContext {
            inventory: InventoryClient::new(self.inventory.client()),
            payments: PaymentClient::new(self.payments.client()),
            shipments: ShipmentClient::new(self.shipments.client()),
            gateway: self.gateway.clone(),
            settings: WorkflowConfig::default(),
        }));
        let orders = OrderClient::new(
            client,
            CartClient::new(self.carts.client()),
            PaymentClient::new(self.payments.client()),
            substrate,
            self.gateway.clone(),
        );
        (orders, handle)
    }

    fn expect_admission(&mut self, stock: u32, quantity: u32) {
        self.inventory
            .expect_query(merchant())
            .return_ok(InventoryQueryResult::Item(widget(stock)));
        self.inventory
            .expect_action(merchant())
            .return_ok(InventoryActionResult::ReserveStock(vec![widget(stock - quantity)]));
    }

    fn verify(&self) {
        self.inventory.verify();
        self.payments.verify();
        self.shipments.verify();
    }
}

fn merchant() -> MerchantId {
    MerchantId::from("m_001")
}

fn widget(quantity: u32) -> MerchantItem {
    MerchantItem {
        item_id: ItemId::from("i_001"),
        name: "Widget".into(),
        description: String::new(),
        price: 100.0,
        quantity,
    }
}

fn request(quantity: i64, mode: CheckoutMode) -> OrderRequest {
    OrderRequest {
        customer_id: CustomerId::from("cust_1"),
        merchant_id: merchant(),
        items: vec![ItemRequest::new("i_001", quantity)],
        mode,
    }
}

fn card() -> CheckoutMode {
    CheckoutMode::Synchronous(PaymentMethod::CreditCard {
        last_four: "4242".into(),
    })
}

fn payment_receipt(status: PaymentStatus, failure_reason: Option<&str>) -> PaymentReceipt {
    PaymentReceipt {
        payment_id: PaymentId::from("pay_ord_1"),
        status,
        invoice_url: None,
        failure_reason: failure_reason.map(str::to_string),
    }
}

fn tracking(status: ShipmentStatus, location: &str) -> TrackingInfo {
    TrackingInfo {
        shipment_id: ShipmentId::from("shp_ord_1"),
        tracking_number: "TRACK-0000AAAA".into(),
        carrier: "FedEx".into(),
        status,
        current_location: location.into(),
        estimated_delivery: None,
        events: Vec::new(),
    }
}

/// A paid synchronous checkout reserves stock, charges under the derived payment id and
/// ships under the derived shipment id.
#[tokio::test]
async fn paid_checkout_reaches_delivered() {
    let mut deps = Deps::new();
    deps.expect_admission(50, 2);
    deps.payments
        .expect_action(PaymentId::from("pay_ord_1"))
        .return_ok(PaymentActionResult::ProcessPayment(payment_receipt(PaymentStatus::Completed, None)));
    deps.shipments
        .expect_action(ShipmentId::from("shp_ord_1"))
        .return_ok(ShipmentActionResult::CreateShipment(ShipmentReceipt {
            shipment_id: ShipmentId::from("shp_ord_1"),
            tracking_number: "TRACK-0000AAAA".into(),
            estimated_delivery: None,
        }));
    deps.shipments
        .expect_action(ShipmentId::from("shp_ord_1"))
        .return_ok(ShipmentActionResult::UpdateShipmentStatus(tracking(ShipmentStatus::InTransit, "In transit")));
    deps.shipments
        .expect_action(ShipmentId::from("shp_ord_1"))
        .return_ok(ShipmentActionResult::UpdateShipmentStatus(tracking(ShipmentStatus::Delivered, "Customer")));
    let (orders, actor_handle) = deps.spawn();

    let receipt = orders.place_order(OrderId::from("ord_1"), request(2, card())).await.unwrap();

    assert_eq!(receipt.status, OrderStatus::Delivered);
    assert_eq!(receipt.total_amount, 200.0);
    assert_eq!(receipt.tracking_number.as_deref(), Some("TRACK-0000AAAA"));
    assert!(matches!(
        deps.payments.received_actions().as_slice(),
        [(_, PaymentAction::ProcessPayment { amount, .. })] if *amount == 200.0
    ));
    assert!(matches!(
        deps.shipments.received_actions().as_slice(),
        [
            (_, ShipmentAction::CreateShipment { .. }),
            (_, ShipmentAction::UpdateShipmentStatus { status: ShipmentStatus::InTransit, .. }),
            (_, ShipmentAction::UpdateShipmentStatus { status: ShipmentStatus::Delivered, .. }),
        ]
    ));
    let stored = orders.get(OrderId::from("ord_1")).await.unwrap().expect("order committed");
    assert_eq!(stored.status, Some(OrderStatus::Delivered));
    assert_eq!(stored.shipment_id, Some(ShipmentId::from("shp_ord_1")));
    let row = deps.gateway.get_order(&OrderId::from("ord_1")).await.unwrap().expect("order row");
    assert_eq!(row.row.status, OrderStatus::Delivered);
    deps.verify();

    drop(orders);
    actor_handle.await.unwrap();
}

/// A FAILED receipt cancels the order and releases the reservation; nothing is shipped.
#[tokio::test]
async fn failed_payment_releases_stock() {
    let mut deps = Deps::new();
    deps.expect_admission(50, 2);
    deps.payments
        .expect_action(PaymentId::from("pay_ord_1"))
        .return_ok(PaymentActionResult::ProcessPayment(payment_receipt(
            PaymentStatus::Failed,
            Some("card declined"),
        )));
    deps.inventory
        .expect_action(merchant())
        .return_ok(InventoryActionResult::ReleaseStock);
    let (orders, actor_handle) = deps.spawn();

    let receipt = orders.place_order(OrderId::from("ord_1"), request(2, card())).await.unwrap();

    assert_eq!(receipt.status, OrderStatus::Cancelled);
    assert_eq!(receipt.tracking_number, None);
    let actions = deps.inventory.received_actions();
    assert!(matches!(actions.last(), Some((_, InventoryAction::ReleaseStock(lines))) if lines[0].quantity == 2));
    let stored = orders.get(OrderId::from("ord_1")).await.unwrap().unwrap();
    assert_eq!(stored.cancellation_reason.as_deref(), Some("card declined"));
    assert!(deps.shipments.received_actions().is_empty());
    deps.verify();

    drop(orders);
    actor_handle.await.unwrap();
}

/// An invoice order parks on its token; cancelling it from outside wakes it and releases
/// the stock exactly once.
#[tokio::test]
async fn parked_invoice_order_can_be_cancelled() {
    let mut deps = Deps::new();
    deps.expect_admission(50, 2);
    deps.payments
        .expect_action(PaymentId::from("pay_ord_1"))
        .return_ok(PaymentActionResult::IssueInvoice(PaymentReceipt {
            payment_id: PaymentId::from("pay_ord_1"),
            status: PaymentStatus::Pending,
            invoice_url: Some("https://example.test/invoices/pay_ord_1".into()),
            failure_reason: None,
        }));
    deps.inventory
        .expect_action(merchant())
        .return_ok(InventoryActionResult::ReleaseStock);
    let (orders, actor_handle) = deps.spawn();

    let receipt = orders
        .place_order(OrderId::from("ord_1"), request(2, CheckoutMode::Invoice))
        .await
        .unwrap();
    assert_eq!(receipt.status, OrderStatus::Pending);
    assert_eq!(receipt.invoice_url.as_deref(), Some("https://example.test/invoices/pay_ord_1"));

    let status = orders
        .cancel_order(OrderId::from("ord_1"), "customer request".into())
        .await
        .unwrap();

    assert_eq!(status, OrderStatus::Cancelled);
    let releases = deps
        .inventory
        .received_actions()
        .into_iter()
        .filter(|(_, action)| matches!(action, InventoryAction::ReleaseStock(_)))
        .count();
    assert_eq!(releases, 1);
    deps.verify();

    drop(orders);
    actor_handle.await.unwrap();
}
