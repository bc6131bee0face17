use crate::model::{CustomerId, ItemId, MerchantId};
use serde::{Deserialize, Serialize};

/// A customer's pending selection. All lines belong to one merchant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub customer_id: CustomerId,
    /// `None` while the cart is empty.
    pub merchant_id: Option<MerchantId>,
    pub items: Vec<CartLine>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// A requested item and quantity, as submitted by AddToCart or CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub item_id: ItemId,
    pub quantity: i64,
}

impl ItemRequest {
    pub fn new(item_id: impl Into<ItemId>, quantity: i64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

impl Cart {
    pub fn line(&self, item_id: &ItemId) -> Option<&CartLine> {
        self.items.iter().find(|line| &line.item_id == item_id)
    }

    pub fn recompute_total(&mut self) {
        self.total_amount = self
            .items
            .iter()
            .map(|line| f64::from(line.quantity) * line.unit_price)
            .sum();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Empties the cart and forgets its merchant.
    pub fn clear(&mut self) {
        self.items.clear();
        self.merchant_id = None;
        self.total_amount = 0.0;
    }

    /// The lines as order requests, for checkout.
    pub fn as_requests(&self) -> Vec<ItemRequest> {
        self.items
            .iter()
            .map(|line| ItemRequest::new(line.item_id.clone(), i64::from(line.quantity)))
            .collect()
    }
}
