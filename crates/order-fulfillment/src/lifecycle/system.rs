use crate::clients::{CartClient, InventoryClient, OrderClient, PaymentClient, ShipmentClient};
use crate::config::{ConfigError, FulfillmentConfig};
use crate::inventory_actor::InventoryContext;
use crate::order_workflow::OrderContext;
use crate::payment_actor::{PaymentContext, PaymentProcessor, SimulatedProcessor};
use crate::persistence::{InMemoryGateway, SharedGateway};
use crate::shipment_actor::ShipmentContext;
use durable_actor::Substrate;
use std::sync::Arc;
use tracing::{error, info};

/// The running fulfillment core: every actor spawned and wired, with a typed client each.
///
/// # Example
///
/// ```ignore
/// let system = FulfillmentSystem::start(FulfillmentConfig::load()?, gateway, processor)?;
///
/// system.inventory.add_item(merchant_id.clone(), draft).await?;
/// let receipt = system.orders.create_order(request).await?;
///
/// system.shutdown().await?;
/// ```
pub struct FulfillmentSystem {
    pub orders: OrderClient,
    pub inventory: InventoryClient,
    pub carts: CartClient,
    pub payments: PaymentClient,
    pub shipments: ShipmentClient,

    /// Shared with the actors; resolves continuation tokens from outside an invocation.
    pub substrate: Substrate,

    /// The gateway every actor writes through.
    pub gateway: SharedGateway,

    /// Task handles for all running actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl FulfillmentSystem {
    /// Spawns all actors with the given gateway and payment processor.
    pub fn start(
        config: FulfillmentConfig,
        gateway: SharedGateway,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let substrate = Substrate::with_policies(config.retry.step_policy(), config.retry.invocation_policy());
        let capacity = config.mailbox_capacity;
        let grace = config.shutdown_grace();

        // 1. Create actors (no dependencies yet)
        let (inventory_actor, inventory_client) = crate::inventory_actor::new(capacity, substrate.clone());
        let (cart_actor, cart_client) = crate::cart_actor::new(capacity, substrate.clone());
        let (payment_actor, payment_client) = crate::payment_actor::new(capacity, substrate.clone());
        let (shipment_actor, shipment_client) = crate::shipment_actor::new(capacity, substrate.clone());
        let (order_actor, order_client) = crate::order_workflow::new(capacity, substrate.clone());

        let inventory = InventoryClient::new(inventory_client);
        let carts = CartClient::new(cart_client);
        let payments = PaymentClient::new(payment_client);
        let shipments = ShipmentClient::new(shipment_client);

        // 2. Start actors with injected context
        let inventory_handle = tokio::spawn(inventory_actor.with_shutdown_grace(grace).run(InventoryContext {
            gateway: gateway.clone(),
            settings: config.inventory.clone(),
        }));
        let cart_handle = tokio::spawn(cart_actor.with_shutdown_grace(grace).run(inventory.clone()));
        let payment_handle = tokio::spawn(payment_actor.with_shutdown_grace(grace).run(PaymentContext {
            gateway: gateway.clone(),
            processor,
            settings: config.payment.clone(),
        }));
        let shipment_handle = tokio::spawn(shipment_actor.with_shutdown_grace(grace).run(ShipmentContext {
            gateway: gateway.clone(),
            settings: config.shipment.clone(),
        }));
        let order_handle = tokio::spawn(order_actor.with_shutdown_grace(grace).run(OrderContext {
            inventory: inventory.clone(),
            payments: payments.clone(),
            shipments: shipments.clone(),
            gateway: gateway.clone(),
            settings: config.workflow.clone(),
        }));

        let orders = OrderClient::new(
            order_client,
            carts.clone(),
            payments.clone(),
            substrate.clone(),
            gateway.clone(),
        );

        info!(
            mode = ?config.workflow.fulfillment_mode,
            stage_delay_ms = config.workflow.stage_delay_ms,
            failure_rate = config.payment.failure_rate,
            "Fulfillment system started"
        );

        Ok(Self {
            orders,
            inventory,
            carts,
            payments,
            shipments,
            substrate,
            gateway,
            handles: vec![order_handle, cart_handle, payment_handle, shipment_handle, inventory_handle],
        })
    }

    /// In-memory gateway and the randomized payment processor from `config.payment`.
    pub fn start_in_memory(config: FulfillmentConfig) -> Result<Self, ConfigError> {
        let processor = Arc::new(SimulatedProcessor::new(config.payment.failure_rate));
        Self::start(config, Arc::new(InMemoryGateway::new()), processor)
    }

    /// Drops every client, which closes the actors' channels, then waits for the actor
    /// tasks. Fails if any actor task panicked.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        drop(self.orders);
        drop(self.carts);
        drop(self.payments);
        drop(self.shipments);
        drop(self.inventory);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
