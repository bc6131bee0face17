//! Actions and queries for the merchant inventory actor.
//!
//! Actions mutate the catalog or its stock and run one at a time per merchant. Queries read
//! the last committed catalog and may run concurrently.

use crate::model::{ItemDraft, ItemId, ItemPage, MerchantItem, StockLine, StockUpdate};

#[derive(Debug, Clone)]
pub enum InventoryAction {
    /// Creates the item, or overwrites it if the id already exists.
    AddItem(ItemDraft),
    /// Overwrites name, description, price and quantity of an existing item.
    UpdateItem(ItemDraft),
    DeleteItem(ItemId),
    /// Absolute set or delta; the result is floored at zero.
    UpdateStock { item_id: ItemId, update: StockUpdate },
    /// Deducts every line or none of them.
    ///
    /// # Errors
    /// Fails with `InsufficientStock` or `NotFound` for the first line that cannot be served.
    ReserveStock(Vec<StockLine>),
    /// Gives previously reserved units back. Unknown items are skipped.
    ReleaseStock(Vec<StockLine>),
}

/// Results from InventoryActions - variants match 1:1 with InventoryAction
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryActionResult {
    AddItem(MerchantItem),
    UpdateItem(MerchantItem),
    DeleteItem,
    UpdateStock(MerchantItem),
    /// The reserved items with their remaining stock.
    ReserveStock(Vec<MerchantItem>),
    ReleaseStock,
}

#[derive(Debug, Clone)]
pub enum InventoryQuery {
    GetItem(ItemId),
    /// `page_size <= 0` uses the configured default.
    ListItems { page_size: i64, page_token: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InventoryQueryResult {
    Item(MerchantItem),
    Page(ItemPage),
}
