//! # Cart Client
//!
//! Provides a high‑level API for interacting with the `Cart` actor.
use crate::cart_actor::{CartAction, CartError, CartQuery};
use crate::model::{Cart, CustomerId, ItemId, ItemRequest, MerchantId};
use async_trait::async_trait;
use durable_actor::{ActorClient, FrameworkError, ResourceClient};
use tracing::{debug, instrument};

/// Client for interacting with the Cart actor.
#[derive(Clone)]
pub struct CartClient {
    inner: ResourceClient<Cart>,
}

#[async_trait]
impl ActorClient<Cart> for CartClient {
    type Error = CartError;

    fn inner(&self) -> &ResourceClient<Cart> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        CartError::ActorCommunicationError(e.to_string())
    }
}

impl CartClient {
    pub fn new(inner: ResourceClient<Cart>) -> Self {
        Self { inner }
    }

    async fn act(&self, customer_id: CustomerId, action: CartAction) -> Result<Cart, CartError> {
        debug!("Sending request");
        self.inner
            .perform_action(customer_id, action)
            .await
            .map_err(Self::lift_error)
    }

    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        customer_id: CustomerId,
        merchant_id: MerchantId,
        items: Vec<ItemRequest>,
    ) -> Result<Cart, CartError> {
        self.act(customer_id, CartAction::AddToCart { merchant_id, items }).await
    }

    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &self,
        customer_id: CustomerId,
        item_id: ItemId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        self.act(customer_id, CartAction::UpdateCartItem { item_id, quantity })
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, customer_id: CustomerId, item_ids: Vec<ItemId>) -> Result<Cart, CartError> {
        self.act(customer_id, CartAction::RemoveFromCart(item_ids)).await
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self, customer_id: CustomerId) -> Result<Cart, CartError> {
        self.act(customer_id, CartAction::ClearCart).await
    }

    #[instrument(skip(self))]
    pub async fn view_cart(&self, customer_id: CustomerId) -> Result<Cart, CartError> {
        debug!("Sending request");
        self.inner
            .query(customer_id, CartQuery::ViewCart)
            .await
            .map_err(Self::lift_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use durable_actor::mock::{create_mock_client, expect_action, MockClient};

    #[tokio::test]
    async fn clear_cart_sends_clear_action() {
        let (client, mut receiver) = create_mock_client::<Cart>(10);
        let carts = CartClient::new(client);

        let task = tokio::spawn(async move { carts.clear_cart(CustomerId::from("cust_1")).await });

        let (key, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        assert_eq!(key, CustomerId::from("cust_1"));
        assert!(matches!(action, CartAction::ClearCart));
        responder.expect("responder").send(Ok(Cart::default())).unwrap();

        assert!(task.await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn merchant_mismatch_is_a_validation_error() {
        let mut mock = MockClient::<Cart>::new();
        mock.expect_action(CustomerId::from("cust_1"))
            .return_entity_err(CartError::MerchantMismatch {
                cart: MerchantId::from("m_A"),
                requested: MerchantId::from("m_B"),
            });

        let err = CartClient::new(mock.client())
            .add_to_cart(
                CustomerId::from("cust_1"),
                MerchantId::from("m_B"),
                vec![ItemRequest::new("i_1", 1)],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        mock.verify();
    }
}
