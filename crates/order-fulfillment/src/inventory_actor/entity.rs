//! ActorEntity implementation for the merchant inventory.
//!
//! The catalog is written to the persistence gateway *before* the actor state changes, so
//! a failed catalog write leaves both sides untouched. Stock movements are the reverse:
//! the actor state is authoritative and the gateway copy is refreshed best-effort.
//!
//! After a cold start the actor's own state is empty; the catalog is hydrated lazily from
//! the gateway on activation and on the first read.

use super::actions::{InventoryAction, InventoryActionResult, InventoryQuery, InventoryQueryResult};
use super::error::InventoryError;
use super::InventoryContext;
use crate::error::{check_amount, check_quantity};
use crate::model::{ItemDraft, ItemId, MerchantId, MerchantInventory, MerchantItem, StockLine, StockUpdate};
use async_trait::async_trait;
use durable_actor::{ActorEntity, Invocation, StepError};
use tracing::{debug, info, warn};

#[async_trait]
impl ActorEntity for MerchantInventory {
    type Key = MerchantId;
    type Action = InventoryAction;
    type ActionResult = InventoryActionResult;
    type Query = InventoryQuery;
    type QueryResult = InventoryQueryResult;
    type Context = InventoryContext;
    type Error = InventoryError;
    const KIND: &'static str = "MerchantInventory";

    async fn on_activate(&mut self, key: &MerchantId, ctx: &InventoryContext) -> Result<(), InventoryError> {
        self.merchant_id = key.clone();
        if !self.hydrated {
            self.hydrate(key, ctx).await;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: InventoryAction,
        inv: &Invocation<Self>,
        ctx: &InventoryContext,
    ) -> Result<InventoryActionResult, InventoryError> {
        if !self.hydrated {
            self.hydrate(inv.key(), ctx).await;
        }

        match action {
            InventoryAction::AddItem(draft) => {
                let item = validate_draft(&draft)?;
                self.persist_item(&item, inv, ctx).await?;
                self.upsert(item.clone());
                info!(merchant_id = %inv.key(), item_id = %item.item_id, price = item.price, stock = item.quantity, "Item added");
                Ok(InventoryActionResult::AddItem(item))
            }
            InventoryAction::UpdateItem(draft) => {
                let item = validate_draft(&draft)?;
                if self.find(&item.item_id).is_none() {
                    return Err(InventoryError::NotFound(item.item_id));
                }
                self.persist_item(&item, inv, ctx).await?;
                self.upsert(item.clone());
                info!(merchant_id = %inv.key(), item_id = %item.item_id, "Item updated");
                Ok(InventoryActionResult::UpdateItem(item))
            }
            InventoryAction::DeleteItem(item_id) => {
                require_item_id(&item_id)?;
                if self.find(&item_id).is_none() {
                    return Err(InventoryError::NotFound(item_id));
                }
                let gateway = &ctx.gateway;
                let merchant_id = inv.key();
                let target = &item_id;
                inv.run("delete_item", || async move {
                    gateway
                        .delete_merchant_item(merchant_id, target)
                        .await
                        .map_err(StepError::from)
                })
                .await?;
                self.remove(&item_id);
                info!(merchant_id = %inv.key(), %item_id, "Item deleted");
                Ok(InventoryActionResult::DeleteItem)
            }
            InventoryAction::UpdateStock { item_id, update } => {
                require_item_id(&item_id)?;
                let item = self.update_stock(&item_id, update, ctx)?;
                self.persist_best_effort(inv.key(), &item, ctx).await;
                info!(merchant_id = %inv.key(), %item_id, stock = item.quantity, "Stock updated");
                Ok(InventoryActionResult::UpdateStock(item))
            }
            InventoryAction::ReserveStock(lines) => {
                let reserved = self.reserve(&lines)?;
                for item in &reserved {
                    self.persist_best_effort(inv.key(), item, ctx).await;
                }
                info!(merchant_id = %inv.key(), lines = reserved.len(), "Stock reserved");
                Ok(InventoryActionResult::ReserveStock(reserved))
            }
            InventoryAction::ReleaseStock(lines) => {
                let released = self.release(&lines);
                for item in &released {
                    self.persist_best_effort(inv.key(), item, ctx).await;
                }
                info!(merchant_id = %inv.key(), lines = released.len(), "Stock released");
                Ok(InventoryActionResult::ReleaseStock)
            }
        }
    }

    async fn handle_query(
        &self,
        query: InventoryQuery,
        key: &MerchantId,
        ctx: &InventoryContext,
    ) -> Result<InventoryQueryResult, InventoryError> {
        let loaded;
        let inventory = if self.hydrated {
            self
        } else {
            let mut copy = self.clone();
            copy.hydrate(key, ctx).await;
            loaded = copy;
            &loaded
        };

        match query {
            InventoryQuery::GetItem(item_id) => inventory
                .find(&item_id)
                .cloned()
                .map(InventoryQueryResult::Item)
                .ok_or(InventoryError::NotFound(item_id)),
            InventoryQuery::ListItems { page_size, page_token } => {
                let page_size = usize::try_from(page_size)
                    .ok()
                    .filter(|size| *size > 0)
                    .unwrap_or(ctx.settings.default_page_size);
                Ok(InventoryQueryResult::Page(inventory.page(page_size, &page_token)))
            }
        }
    }
}

impl MerchantInventory {
    /// Merges the gateway catalog into the actor state. Items the actor already holds win.
    /// A gateway failure leaves the state as it is and hydration is retried next time.
    async fn hydrate(&mut self, key: &MerchantId, ctx: &InventoryContext) {
        match ctx.gateway.list_merchant_items(key).await {
            Ok(rows) => {
                let loaded = rows.len();
                for row in rows {
                    if self.find(&row.item_id).is_none() {
                        self.items.push(row);
                    }
                }
                self.hydrated = true;
                debug!(entity_type = Self::KIND, %key, loaded, "Catalog hydrated");
            }
            Err(e) => {
                warn!(entity_type = Self::KIND, %key, error = %e, "Catalog hydration failed");
            }
        }
    }

    /// Required write: the action fails if the catalog row cannot be stored.
    async fn persist_item(
        &self,
        item: &MerchantItem,
        inv: &Invocation<Self>,
        ctx: &InventoryContext,
    ) -> Result<(), InventoryError> {
        let gateway = &ctx.gateway;
        let merchant_id = inv.key();
        inv.run("persist_item", || async move {
            gateway
                .upsert_merchant_item(merchant_id, item)
                .await
                .map_err(StepError::from)
        })
        .await?;
        Ok(())
    }

    async fn persist_best_effort(&self, merchant_id: &MerchantId, item: &MerchantItem, ctx: &InventoryContext) {
        if let Err(e) = ctx.gateway.upsert_merchant_item(merchant_id, item).await {
            warn!(entity_type = Self::KIND, key = %merchant_id, item_id = %item.item_id, error = %e, "Stock change not persisted");
        }
    }

    fn update_stock(
        &mut self,
        item_id: &ItemId,
        update: StockUpdate,
        ctx: &InventoryContext,
    ) -> Result<MerchantItem, InventoryError> {
        if let Some(item) = self.find_mut(item_id) {
            item.quantity = update.apply(item.quantity);
            return Ok(item.clone());
        }

        let baseline = ctx
            .settings
            .implicit_stock_baseline
            .ok_or_else(|| InventoryError::NotFound(item_id.clone()))?;
        warn!(entity_type = Self::KIND, %item_id, baseline, "Creating unknown item from stock update");
        let item = MerchantItem {
            item_id: item_id.clone(),
            name: item_id.to_string(),
            description: String::new(),
            price: 0.0,
            quantity: update.apply(baseline),
        };
        self.items.push(item.clone());
        Ok(item)
    }

    fn reserve(&mut self, lines: &[StockLine]) -> Result<Vec<MerchantItem>, InventoryError> {
        let wanted = merge_lines(lines)?;

        for line in &wanted {
            let item = self
                .find(&line.item_id)
                .ok_or_else(|| InventoryError::NotFound(line.item_id.clone()))?;
            if item.quantity < line.quantity {
                return Err(InventoryError::InsufficientStock {
                    item_id: line.item_id.clone(),
                    requested: line.quantity,
                    available: item.quantity,
                });
            }
        }

        let mut reserved = Vec::with_capacity(wanted.len());
        for line in &wanted {
            if let Some(item) = self.find_mut(&line.item_id) {
                item.quantity -= line.quantity;
                reserved.push(item.clone());
            }
        }
        Ok(reserved)
    }

    fn release(&mut self, lines: &[StockLine]) -> Vec<MerchantItem> {
        let mut released = Vec::with_capacity(lines.len());
        for line in lines {
            match self.find_mut(&line.item_id) {
                Some(item) => {
                    item.quantity = item.quantity.saturating_add(line.quantity);
                    released.push(item.clone());
                }
                None => {
                    warn!(entity_type = Self::KIND, item_id = %line.item_id, "Release for unknown item skipped");
                }
            }
        }
        released
    }
}

fn require_item_id(item_id: &ItemId) -> Result<(), InventoryError> {
    if item_id.is_empty() {
        return Err(InventoryError::Validation("item_id is required".into()));
    }
    Ok(())
}

fn validate_draft(draft: &ItemDraft) -> Result<MerchantItem, InventoryError> {
    require_item_id(&draft.item_id)?;
    if draft.name.trim().is_empty() {
        return Err(InventoryError::Validation("name is required".into()));
    }
    check_amount("price", draft.price).map_err(InventoryError::Validation)?;
    let quantity = check_quantity("quantity", draft.quantity).map_err(InventoryError::Validation)?;

    Ok(MerchantItem {
        item_id: draft.item_id.clone(),
        name: draft.name.clone(),
        description: draft.description.clone(),
        price: draft.price,
        quantity,
    })
}

/// Folds duplicate items into one line each, keeping first-seen order.
fn merge_lines(lines: &[StockLine]) -> Result<Vec<StockLine>, InventoryError> {
    if lines.is_empty() {
        return Err(InventoryError::Validation("at least one line is required".into()));
    }
    let mut merged: Vec<StockLine> = Vec::with_capacity(lines.len());
    for line in lines {
        require_item_id(&line.item_id)?;
        if line.quantity == 0 {
            return Err(InventoryError::Validation(format!(
                "quantity for {} must be positive",
                line.item_id
            )));
        }
        match merged.iter_mut().find(|existing| existing.item_id == line.item_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(line.quantity).ok_or_else(|| {
                    InventoryError::Validation(format!("quantity for {} is too large", line.item_id))
                })?;
            }
            None => merged.push(line.clone()),
        }
    }
    Ok(merged)
}
