//! # Inventory Client
//!
//! Provides a high‑level API for interacting with the `MerchantInventory` actor.
//! It wraps a `ResourceClient<MerchantInventory>` and exposes catalog and stock methods.
use crate::inventory_actor::{
    InventoryAction, InventoryActionResult, InventoryError, InventoryQuery, InventoryQueryResult,
};
use crate::model::{ItemDraft, ItemId, ItemPage, MerchantId, MerchantInventory, MerchantItem, StockLine, StockUpdate};
use async_trait::async_trait;
use durable_actor::{ActorClient, FrameworkError, ResourceClient};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Client for interacting with the MerchantInventory actor.
#[derive(Clone)]
pub struct InventoryClient {
    inner: ResourceClient<MerchantInventory>,
}

#[async_trait]
impl ActorClient<MerchantInventory> for InventoryClient {
    type Error = InventoryError;

    fn inner(&self) -> &ResourceClient<MerchantInventory> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        InventoryError::ActorCommunicationError(e.to_string())
    }
}

fn unexpected(response: impl Debug) -> InventoryError {
    InventoryError::ActorCommunicationError(format!("unexpected response: {response:?}"))
}

impl InventoryClient {
    pub fn new(inner: ResourceClient<MerchantInventory>) -> Self {
        Self { inner }
    }

    async fn act(&self, merchant_id: MerchantId, action: InventoryAction) -> Result<InventoryActionResult, InventoryError> {
        self.inner
            .perform_action(merchant_id, action)
            .await
            .map_err(Self::lift_error)
    }

    async fn ask(&self, merchant_id: MerchantId, query: InventoryQuery) -> Result<InventoryQueryResult, InventoryError> {
        self.inner.query(merchant_id, query).await.map_err(Self::lift_error)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, merchant_id: MerchantId, item_id: ItemId) -> Result<MerchantItem, InventoryError> {
        debug!("Sending request");
        match self.ask(merchant_id, InventoryQuery::GetItem(item_id)).await? {
            InventoryQueryResult::Item(item) => Ok(item),
            other => Err(unexpected(other)),
        }
    }

    /// One page of the catalog. Pass the returned token back for the next page; an empty
    /// token marks the last one.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        merchant_id: MerchantId,
        page_size: i64,
        page_token: String,
    ) -> Result<ItemPage, InventoryError> {
        debug!("Sending request");
        match self
            .ask(merchant_id, InventoryQuery::ListItems { page_size, page_token })
            .await?
        {
            InventoryQueryResult::Page(page) => Ok(page),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn add_item(&self, merchant_id: MerchantId, draft: ItemDraft) -> Result<MerchantItem, InventoryError> {
        debug!("Sending request");
        match self.act(merchant_id, InventoryAction::AddItem(draft)).await? {
            InventoryActionResult::AddItem(item) => Ok(item),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn update_item(&self, merchant_id: MerchantId, draft: ItemDraft) -> Result<MerchantItem, InventoryError> {
        debug!("Sending request");
        match self.act(merchant_id, InventoryAction::UpdateItem(draft)).await? {
            InventoryActionResult::UpdateItem(item) => Ok(item),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, merchant_id: MerchantId, item_id: ItemId) -> Result<(), InventoryError> {
        debug!("Sending request");
        match self.act(merchant_id, InventoryAction::DeleteItem(item_id)).await? {
            InventoryActionResult::DeleteItem => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        merchant_id: MerchantId,
        item_id: ItemId,
        update: StockUpdate,
    ) -> Result<MerchantItem, InventoryError> {
        debug!("Sending request");
        match self
            .act(merchant_id, InventoryAction::UpdateStock { item_id, update })
            .await?
        {
            InventoryActionResult::UpdateStock(item) => Ok(item),
            other => Err(unexpected(other)),
        }
    }

    /// Deducts all lines atomically and returns the remaining stock of each item.
    #[instrument(skip(self))]
    pub async fn reserve_stock(
        &self,
        merchant_id: MerchantId,
        lines: Vec<StockLine>,
    ) -> Result<Vec<MerchantItem>, InventoryError> {
        debug!("Reserving {} lines", lines.len());
        match self.act(merchant_id, InventoryAction::ReserveStock(lines)).await? {
            InventoryActionResult::ReserveStock(items) => Ok(items),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn release_stock(&self, merchant_id: MerchantId, lines: Vec<StockLine>) -> Result<(), InventoryError> {
        debug!("Releasing {} lines", lines.len());
        match self.act(merchant_id, InventoryAction::ReleaseStock(lines)).await? {
            InventoryActionResult::ReleaseStock => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use durable_actor::mock::{create_mock_client, expect_action, expect_query, MockClient};

    fn widget(quantity: u32) -> MerchantItem {
        MerchantItem {
            item_id: ItemId::from("i_001"),
            name: "Widget".into(),
            description: "desc".into(),
            price: 10.0,
            quantity,
        }
    }

    #[tokio::test]
    async fn get_item_returns_the_item() {
        let (client, mut receiver) = create_mock_client::<MerchantInventory>(10);
        let inventory = InventoryClient::new(client);

        let task = tokio::spawn(async move {
            inventory
                .get_item(MerchantId::from("m_001"), ItemId::from("i_001"))
                .await
        });

        let (key, query, responder) = expect_query(&mut receiver).await.expect("Expected Query request");
        assert_eq!(key, MerchantId::from("m_001"));
        assert!(matches!(query, InventoryQuery::GetItem(ref id) if id.as_str() == "i_001"));
        responder.send(Ok(InventoryQueryResult::Item(widget(5)))).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), widget(5));
    }

    #[tokio::test]
    async fn reserve_stock_sends_all_lines_in_one_action() {
        let (client, mut receiver) = create_mock_client::<MerchantInventory>(10);
        let inventory = InventoryClient::new(client);
        let lines = vec![
            StockLine {
                item_id: ItemId::from("i_001"),
                quantity: 2,
            },
            StockLine {
                item_id: ItemId::from("i_002"),
                quantity: 1,
            },
        ];

        let task = tokio::spawn(async move { inventory.reserve_stock(MerchantId::from("m_001"), lines).await });

        let (_, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        match action {
            InventoryAction::ReserveStock(lines) => assert_eq!(lines.len(), 2),
            other => panic!("Expected ReserveStock action, got {:?}", other),
        }
        responder
            .expect("responder")
            .send(Ok(InventoryActionResult::ReserveStock(vec![widget(48)])))
            .unwrap();

        assert_eq!(task.await.unwrap().unwrap()[0].quantity, 48);
    }

    #[tokio::test]
    async fn typed_errors_reach_the_caller() {
        let mut mock = MockClient::<MerchantInventory>::new();
        mock.expect_action(MerchantId::from("m_001"))
            .return_entity_err(InventoryError::InsufficientStock {
                item_id: ItemId::from("i_001"),
                requested: 3,
                available: 1,
            });

        let inventory = InventoryClient::new(mock.client());
        let err = inventory
            .reserve_stock(
                MerchantId::from("m_001"),
                vec![StockLine {
                    item_id: ItemId::from("i_001"),
                    quantity: 3,
                }],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, InventoryError::InsufficientStock { available: 1, .. }));
        mock.verify();
    }

    #[tokio::test]
    async fn closed_actor_is_a_communication_error() {
        let mut mock = MockClient::<MerchantInventory>::new();
        mock.expect_query(MerchantId::from("m_001"))
            .return_err(FrameworkError::ActorClosed);

        let err = InventoryClient::new(mock.client())
            .list_items(MerchantId::from("m_001"), 2, String::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Communication);
    }
}
