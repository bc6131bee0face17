//! In-memory persistence gateway.

use super::{GatewayError, OrderLineRow, OrderRow, PaymentRow, PersistenceGateway, ShipmentRow, Stamped};
use crate::model::{
    CustomerId, ItemId, MerchantId, MerchantItem, OrderId, OrderStatus, PaymentId, PaymentStatus, ShipmentId,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

#[derive(Default)]
struct Tables {
    orders: HashMap<OrderId, Stamped<OrderRow>>,
    order_history: HashMap<OrderId, Vec<OrderStatus>>,
    order_lines: BTreeMap<(OrderId, ItemId), OrderLineRow>,
    payments: HashMap<PaymentId, Stamped<PaymentRow>>,
    payment_history: HashMap<PaymentId, Vec<PaymentStatus>>,
    shipments: HashMap<ShipmentId, Stamped<ShipmentRow>>,
    merchant_items: BTreeMap<MerchantId, Vec<MerchantItem>>,
}

/// Relational tables held in process memory.
///
/// `set_unavailable(true)` makes every call fail with [`GatewayError::Unavailable`], which
/// is how tests exercise the required-write and best-effort paths.
#[derive(Default)]
pub struct InMemoryGateway {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

fn upsert_stamped<K, R>(table: &mut HashMap<K, Stamped<R>>, key: K, row: R)
where
    K: std::hash::Hash + Eq,
{
    let now = Utc::now();
    match table.entry(key) {
        Entry::Occupied(mut entry) => {
            let existing = entry.get_mut();
            existing.row = row;
            existing.updated_at = now;
        }
        Entry::Vacant(entry) => {
            entry.insert(Stamped {
                row,
                created_at: now,
                updated_at: now,
            });
        }
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every subsequent call until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(GatewayError::Unavailable("in-memory gateway switched off".into()))
        } else {
            Ok(())
        }
    }

    /// The distinct statuses an order has been stored with, oldest first. Rewrites of the
    /// current status are not repeated.
    pub fn order_history(&self, order_id: &OrderId) -> Vec<OrderStatus> {
        self.tables
            .read()
            .order_history
            .get(order_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every status ever written for a payment, in write order.
    pub fn payment_history(&self, payment_id: &PaymentId) -> Vec<PaymentStatus> {
        self.tables
            .read()
            .payment_history
            .get(payment_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn payment_rows_for_order(&self, order_id: &OrderId) -> usize {
        self.tables
            .read()
            .payments
            .values()
            .filter(|stamped| &stamped.row.order_id == order_id)
            .count()
    }

    pub fn shipment_rows_for_order(&self, order_id: &OrderId) -> usize {
        self.tables
            .read()
            .shipments
            .values()
            .filter(|stamped| &stamped.row.order_id == order_id)
            .count()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn upsert_order(&self, row: &OrderRow) -> Result<(), GatewayError> {
        self.check()?;
        let mut row = row.clone();
        let mut tables = self.tables.write();
        if let Some(existing) = tables.orders.get(&row.order_id) {
            if existing.row.merchant_id != row.merchant_id {
                warn!(order_id = %row.order_id, kept = %existing.row.merchant_id, "Ignoring merchant_id change on order upsert");
                row.merchant_id = existing.row.merchant_id.clone();
            }
        }
        let history = tables.order_history.entry(row.order_id.clone()).or_default();
        if history.last() != Some(&row.status) {
            history.push(row.status);
        }
        let key = row.order_id.clone();
        upsert_stamped(&mut tables.orders, key, row);
        Ok(())
    }

    async fn upsert_order_lines(&self, lines: &[OrderLineRow]) -> Result<(), GatewayError> {
        self.check()?;
        let mut tables = self.tables.write();
        for line in lines {
            tables
                .order_lines
                .insert((line.order_id.clone(), line.item_id.clone()), line.clone());
        }
        Ok(())
    }

    async fn upsert_payment(&self, row: &PaymentRow) -> Result<(), GatewayError> {
        self.check()?;
        let mut tables = self.tables.write();
        tables
            .payment_history
            .entry(row.payment_id.clone())
            .or_default()
            .push(row.status);
        upsert_stamped(&mut tables.payments, row.payment_id.clone(), row.clone());
        Ok(())
    }

    async fn upsert_shipment(&self, row: &ShipmentRow) -> Result<(), GatewayError> {
        self.check()?;
        let mut tables = self.tables.write();
        upsert_stamped(&mut tables.shipments, row.shipment_id.clone(), row.clone());
        Ok(())
    }

    async fn upsert_merchant_item(&self, merchant_id: &MerchantId, item: &MerchantItem) -> Result<(), GatewayError> {
        self.check()?;
        if item.item_id.is_empty() {
            return Err(GatewayError::Constraint("merchant_items.item_id must not be empty".into()));
        }
        let mut tables = self.tables.write();
        let items = tables.merchant_items.entry(merchant_id.clone()).or_default();
        match items.iter_mut().find(|existing| existing.item_id == item.item_id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(())
    }

    async fn delete_merchant_item(&self, merchant_id: &MerchantId, item_id: &ItemId) -> Result<bool, GatewayError> {
        self.check()?;
        let mut tables = self.tables.write();
        let Some(items) = tables.merchant_items.get_mut(merchant_id) else {
            return Ok(false);
        };
        let before = items.len();
        items.retain(|item| &item.item_id != item_id);
        Ok(items.len() < before)
    }

    async fn list_merchant_items(&self, merchant_id: &MerchantId) -> Result<Vec<MerchantItem>, GatewayError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .merchant_items
            .get(merchant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Stamped<OrderRow>>, GatewayError> {
        self.check()?;
        Ok(self.tables.read().orders.get(order_id).cloned())
    }

    async fn list_orders(&self, customer_id: Option<&CustomerId>) -> Result<Vec<Stamped<OrderRow>>, GatewayError> {
        self.check()?;
        let mut orders: Vec<_> = self
            .tables
            .read()
            .orders
            .values()
            .filter(|stamped| customer_id.map_or(true, |customer| &stamped.row.customer_id == customer))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn find_order_by_payment(&self, payment_id: &PaymentId) -> Result<Option<OrderId>, GatewayError> {
        self.check()?;
        let tables = self.tables.read();
        let from_orders = tables
            .orders
            .values()
            .find(|stamped| stamped.row.payment_id.as_ref() == Some(payment_id))
            .map(|stamped| stamped.row.order_id.clone());
        Ok(from_orders.or_else(|| tables.payments.get(payment_id).map(|stamped| stamped.row.order_id.clone())))
    }

    async fn order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLineRow>, GatewayError> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .order_lines
            .values()
            .filter(|line| &line.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn get_payment(&self, payment_id: &PaymentId) -> Result<Option<Stamped<PaymentRow>>, GatewayError> {
        self.check()?;
        Ok(self.tables.read().payments.get(payment_id).cloned())
    }

    async fn get_shipment(&self, shipment_id: &ShipmentId) -> Result<Option<Stamped<ShipmentRow>>, GatewayError> {
        self.check()?;
        Ok(self.tables.read().shipments.get(shipment_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_row(order_id: &str, merchant: &str, status: OrderStatus) -> OrderRow {
        OrderRow {
            order_id: OrderId::from(order_id),
            customer_id: CustomerId::from("cust_1"),
            merchant_id: MerchantId::from(merchant),
            status,
            total_amount: 10.0,
            payment_id: Some(PaymentId::from("pay_1")),
            shipment_id: None,
            tracking_number: None,
            continuation_token: None,
            invoice_url: None,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_created_at_and_merchant() {
        let gateway = InMemoryGateway::new();
        gateway
            .upsert_order(&order_row("ord_1", "m_001", OrderStatus::Pending))
            .await
            .unwrap();
        let first = gateway.get_order(&OrderId::from("ord_1")).await.unwrap().unwrap();

        gateway
            .upsert_order(&order_row("ord_1", "m_999", OrderStatus::Processing))
            .await
            .unwrap();
        let second = gateway.get_order(&OrderId::from("ord_1")).await.unwrap().unwrap();

        assert_eq!(second.row.status, OrderStatus::Processing);
        assert_eq!(second.row.merchant_id, MerchantId::from("m_001"));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn order_history_skips_rewrites_of_the_same_status() {
        let gateway = InMemoryGateway::new();
        for status in [OrderStatus::Pending, OrderStatus::Pending, OrderStatus::Processing] {
            gateway.upsert_order(&order_row("ord_1", "m_001", status)).await.unwrap();
        }

        assert_eq!(
            gateway.order_history(&OrderId::from("ord_1")),
            vec![OrderStatus::Pending, OrderStatus::Processing]
        );
        assert!(gateway.order_history(&OrderId::from("ord_2")).is_empty());
    }

    #[tokio::test]
    async fn unavailable_gateway_fails_every_call() {
        let gateway = InMemoryGateway::new();
        gateway.set_unavailable(true);
        let result = gateway.list_merchant_items(&MerchantId::from("m_001")).await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));

        gateway.set_unavailable(false);
        assert!(gateway.list_merchant_items(&MerchantId::from("m_001")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn payments_are_found_by_external_reference() {
        let gateway = InMemoryGateway::new();
        gateway
            .upsert_order(&order_row("ord_7", "m_001", OrderStatus::Pending))
            .await
            .unwrap();
        let found = gateway.find_order_by_payment(&PaymentId::from("pay_1")).await.unwrap();
        assert_eq!(found, Some(OrderId::from("ord_7")));
        assert_eq!(gateway.find_order_by_payment(&PaymentId::from("pay_x")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn merchant_items_keep_insertion_order() {
        let gateway = InMemoryGateway::new();
        let merchant = MerchantId::from("m_001");
        for id in ["b", "a", "c"] {
            let item = MerchantItem {
                item_id: ItemId::from(id),
                name: id.to_uppercase(),
                description: String::new(),
                price: 1.0,
                quantity: 1,
            };
            gateway.upsert_merchant_item(&merchant, &item).await.unwrap();
        }
        assert!(gateway.delete_merchant_item(&merchant, &ItemId::from("a")).await.unwrap());

        let ids: Vec<_> = gateway
            .list_merchant_items(&merchant)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.item_id.to_string())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
