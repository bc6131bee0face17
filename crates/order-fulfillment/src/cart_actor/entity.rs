//! ActorEntity implementation for the Cart.
//!
//! Mutations are computed on a copy and assigned only once every line has been validated,
//! so a rejected request leaves the cart exactly as it was.

use super::actions::{CartAction, CartQuery};
use super::error::CartError;
use crate::clients::InventoryClient;
use crate::error::check_quantity;
use crate::model::{Cart, CartLine, CustomerId, ItemId, ItemRequest, MerchantId, MerchantItem};
use async_trait::async_trait;
use durable_actor::{ActorEntity, Invocation};
use tracing::info;

#[async_trait]
impl ActorEntity for Cart {
    type Key = CustomerId;
    type Action = CartAction;
    type ActionResult = Cart;
    type Query = CartQuery;
    type QueryResult = Cart;
    type Context = InventoryClient;
    type Error = CartError;
    const KIND: &'static str = "Cart";

    async fn handle_action(
        &mut self,
        action: CartAction,
        inv: &Invocation<Self>,
        inventory: &InventoryClient,
    ) -> Result<Cart, CartError> {
        self.customer_id = inv.key().clone();

        match action {
            CartAction::AddToCart { merchant_id, items } => {
                let next = self.with_added(merchant_id, items, inventory).await?;
                *self = next;
            }
            CartAction::UpdateCartItem { item_id, quantity } => {
                let next = self.with_updated(item_id, quantity, inventory).await?;
                *self = next;
            }
            CartAction::RemoveFromCart(item_ids) => {
                self.items.retain(|line| !item_ids.contains(&line.item_id));
                if self.items.is_empty() {
                    self.clear();
                }
                self.recompute_total();
            }
            CartAction::ClearCart => self.clear(),
        }

        info!(customer_id = %self.customer_id, lines = self.items.len(), total = self.total_amount, "Cart updated");
        Ok(self.clone())
    }

    async fn handle_query(&self, query: CartQuery, key: &CustomerId, _inventory: &InventoryClient) -> Result<Cart, CartError> {
        match query {
            CartQuery::ViewCart => {
                let mut cart = self.clone();
                cart.customer_id = key.clone();
                Ok(cart)
            }
        }
    }
}

impl Cart {
    async fn with_added(
        &self,
        merchant_id: MerchantId,
        items: Vec<ItemRequest>,
        inventory: &InventoryClient,
    ) -> Result<Cart, CartError> {
        if merchant_id.is_empty() {
            return Err(CartError::Validation("merchant_id is required".into()));
        }
        if items.is_empty() {
            return Err(CartError::Validation("at least one item is required".into()));
        }
        if let Some(current) = &self.merchant_id {
            if current != &merchant_id {
                return Err(CartError::MerchantMismatch {
                    cart: current.clone(),
                    requested: merchant_id,
                });
            }
        }

        let mut next = self.clone();
        next.merchant_id = Some(merchant_id.clone());
        for request in items {
            let quantity = positive_quantity(&request)?;
            let item = inventory.get_item(merchant_id.clone(), request.item_id.clone()).await?;
            let merged = next
                .line(&request.item_id)
                .map_or(0, |line| line.quantity)
                .saturating_add(quantity);
            ensure_stock(&item, merged)?;
            next.put_line(&item, merged);
        }
        next.recompute_total();
        Ok(next)
    }

    async fn with_updated(&self, item_id: ItemId, quantity: i64, inventory: &InventoryClient) -> Result<Cart, CartError> {
        if self.line(&item_id).is_none() {
            return Err(CartError::ItemNotFound(item_id));
        }

        let mut next = self.clone();
        if quantity <= 0 {
            next.items.retain(|line| line.item_id != item_id);
            if next.items.is_empty() {
                next.clear();
            }
            next.recompute_total();
            return Ok(next);
        }

        let quantity = check_quantity("quantity", quantity).map_err(CartError::Validation)?;
        let merchant_id = self
            .merchant_id
            .clone()
            .ok_or_else(|| CartError::Validation("cart has no merchant".into()))?;
        let item = inventory.get_item(merchant_id, item_id).await?;
        ensure_stock(&item, quantity)?;
        next.put_line(&item, quantity);
        next.recompute_total();
        Ok(next)
    }

    /// Sets the line for `item` to `quantity`, refreshing name and price from the catalog.
    fn put_line(&mut self, item: &MerchantItem, quantity: u32) {
        let line = CartLine {
            item_id: item.item_id.clone(),
            name: item.name.clone(),
            quantity,
            unit_price: item.price,
        };
        match self.items.iter_mut().find(|existing| existing.item_id == item.item_id) {
            Some(existing) => *existing = line,
            None => self.items.push(line),
        }
    }
}

fn positive_quantity(request: &ItemRequest) -> Result<u32, CartError> {
    if request.item_id.is_empty() {
        return Err(CartError::Validation("item_id is required".into()));
    }
    match check_quantity("quantity", request.quantity).map_err(CartError::Validation)? {
        0 => Err(CartError::Validation(format!("quantity for {} must be positive", request.item_id))),
        quantity => Ok(quantity),
    }
}

fn ensure_stock(item: &MerchantItem, requested: u32) -> Result<(), CartError> {
    if requested > item.quantity {
        return Err(CartError::InsufficientStock {
            item_id: item.item_id.clone(),
            requested,
            available: item.quantity,
        });
    }
    Ok(())
}
