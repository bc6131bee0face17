use crate::model::{ItemId, MerchantId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantItem {
    pub item_id: ItemId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

/// A merchant's catalog and stock.
///
/// # Actor Framework
/// This struct implements the [`ActorEntity`](durable_actor::ActorEntity) trait,
/// allowing it to be managed by a [`ResourceActor`](durable_actor::ResourceActor).
///
/// See [`impl ActorEntity for MerchantInventory`](#impl-ActorEntity-for-MerchantInventory)
/// for the catalog and stock actions ([`InventoryAction`](crate::inventory_actor::InventoryAction)).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MerchantInventory {
    pub merchant_id: MerchantId,
    /// Catalog in insertion order; pagination offsets index into it.
    pub items: Vec<MerchantItem>,
    /// Set once the catalog has been loaded from the persistence gateway.
    pub hydrated: bool,
}

impl MerchantInventory {
    pub fn find(&self, item_id: &ItemId) -> Option<&MerchantItem> {
        self.items.iter().find(|item| &item.item_id == item_id)
    }

    pub fn find_mut(&mut self, item_id: &ItemId) -> Option<&mut MerchantItem> {
        self.items.iter_mut().find(|item| &item.item_id == item_id)
    }

    /// Replaces the item with the same id, or appends it.
    pub fn upsert(&mut self, item: MerchantItem) {
        match self.find_mut(&item.item_id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, item_id: &ItemId) -> Option<MerchantItem> {
        let index = self.items.iter().position(|item| &item.item_id == item_id)?;
        Some(self.items.remove(index))
    }

    /// Offset-token pagination over the catalog.
    ///
    /// The token is the decimal start offset; anything unparsable or negative starts at 0.
    /// The next token is the end offset, or empty on the last page.
    pub fn page(&self, page_size: usize, page_token: &str) -> ItemPage {
        let len = self.items.len();
        let start = page_token
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|offset| *offset >= 0)
            .map(|offset| usize::try_from(offset).unwrap_or(usize::MAX))
            .unwrap_or(0)
            .min(len);
        let end = start.saturating_add(page_size).min(len);

        ItemPage {
            items: self.items[start..end].to_vec(),
            next_page_token: if end < len { end.to_string() } else { String::new() },
        }
    }
}

/// Payload for AddItem and UpdateItem. Quantities arrive signed so negative input can be
/// rejected as a validation error instead of wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub item_id: ItemId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
}

impl ItemDraft {
    pub fn new(
        item_id: impl Into<ItemId>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        quantity: i64,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            description: description.into(),
            price,
            quantity,
        }
    }
}

/// Either an absolute quantity or a delta. The result is clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockUpdate {
    Set(i64),
    Increment(i64),
}

impl StockUpdate {
    pub fn apply(self, current: u32) -> u32 {
        let next = match self {
            StockUpdate::Set(quantity) => quantity,
            StockUpdate::Increment(delta) => i64::from(current).saturating_add(delta),
        };
        next.clamp(0, i64::from(u32::MAX)) as u32
    }
}

/// One line of a stock reservation or release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub item_id: ItemId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPage {
    pub items: Vec<MerchantItem>,
    pub next_page_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> MerchantInventory {
        let mut inventory = MerchantInventory::default();
        for i in 0..n {
            inventory.upsert(MerchantItem {
                item_id: ItemId::from(format!("i_{i:03}")),
                name: format!("Item {i}"),
                description: String::new(),
                price: 1.0,
                quantity: 1,
            });
        }
        inventory
    }

    #[test]
    fn pages_chain_until_the_last_one() {
        let inventory = catalog(5);

        let first = inventory.page(2, "");
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_page_token, "2");

        let second = inventory.page(2, &first.next_page_token);
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.next_page_token, "4");

        let last = inventory.page(2, &second.next_page_token);
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.next_page_token, "");
    }

    #[test]
    fn bad_tokens_start_from_the_beginning() {
        let inventory = catalog(3);
        assert_eq!(inventory.page(2, "abc").items[0].item_id, ItemId::from("i_000"));
        assert_eq!(inventory.page(2, "-4").items[0].item_id, ItemId::from("i_000"));
    }

    #[test]
    fn offsets_past_the_end_yield_an_empty_last_page() {
        let page = catalog(3).page(2, "10");
        assert!(page.items.is_empty());
        assert_eq!(page.next_page_token, "");
    }

    #[test]
    fn stock_never_goes_negative() {
        assert_eq!(StockUpdate::Set(-5).apply(10), 0);
        assert_eq!(StockUpdate::Increment(-20).apply(10), 0);
        assert_eq!(StockUpdate::Increment(5).apply(10), 15);
        assert_eq!(StockUpdate::Set(7).apply(10), 7);
    }

    #[test]
    fn upsert_keeps_position() {
        let mut inventory = catalog(3);
        let mut replacement = inventory.items[1].clone();
        replacement.name = "Renamed".into();
        inventory.upsert(replacement);

        assert_eq!(inventory.items.len(), 3);
        assert_eq!(inventory.items[1].name, "Renamed");
    }
}
