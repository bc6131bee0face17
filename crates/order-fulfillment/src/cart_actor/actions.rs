//! Actions for the Cart actor. Every action returns the resulting cart.

use crate::model::{ItemId, ItemRequest, MerchantId};

#[derive(Debug, Clone)]
pub enum CartAction {
    /// Validates each item against the merchant's stock and merges quantities with lines
    /// already in the cart.
    AddToCart {
        merchant_id: MerchantId,
        items: Vec<ItemRequest>,
    },
    /// `quantity <= 0` removes the line.
    UpdateCartItem { item_id: ItemId, quantity: i64 },
    /// Unknown ids are ignored.
    RemoveFromCart(Vec<ItemId>),
    ClearCart,
}

#[derive(Debug, Clone)]
pub enum CartQuery {
    ViewCart,
}
