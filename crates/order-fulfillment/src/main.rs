//! Demo: stocks a merchant, places a card order and an invoice order, and settles the
//! invoice through the payment webhook.

use durable_actor::tracing::setup_tracing;
use order_fulfillment::config::FulfillmentConfig;
use order_fulfillment::lifecycle::FulfillmentSystem;
use order_fulfillment::model::{
    CheckoutMode, CustomerId, ItemDraft, ItemRequest, MerchantId, OrderRequest, PaymentMethod,
};
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = match FulfillmentConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Configuration not loaded, using defaults");
            FulfillmentConfig::default()
        }
    };

    let system = FulfillmentSystem::start_in_memory(config).map_err(|e| e.to_string())?;
    let merchant_id = MerchantId::from("m_001");
    let customer_id = CustomerId::from("cust_001");

    let span = tracing::info_span!("catalog_setup");
    async {
        info!("Stocking merchant catalog");
        system
            .inventory
            .add_item(
                merchant_id.clone(),
                ItemDraft::new("i_001", "Widget", "A very useful widget", 100.0, 50),
            )
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("card_checkout");
    let card_order = async {
        info!("Placing card order");
        system
            .orders
            .create_order(OrderRequest {
                customer_id: customer_id.clone(),
                merchant_id: merchant_id.clone(),
                items: vec![ItemRequest::new("i_001", 2)],
                mode: CheckoutMode::Synchronous(PaymentMethod::CreditCard {
                    last_four: "4242".into(),
                }),
            })
            .await
    }
    .instrument(span)
    .await;

    match card_order {
        Ok(receipt) => info!(
            order_id = %receipt.order_id,
            status = %receipt.status,
            total = receipt.total_amount,
            tracking_number = ?receipt.tracking_number,
            "Card order finished"
        ),
        Err(e) => error!(error = %e, kind = %e.kind(), "Card order failed"),
    }

    let span = tracing::info_span!("invoice_checkout");
    let invoice_order = async {
        info!("Placing invoice order");
        let receipt = system
            .orders
            .create_order(OrderRequest {
                customer_id: customer_id.clone(),
                merchant_id: merchant_id.clone(),
                items: vec![ItemRequest::new("i_001", 1)],
                mode: CheckoutMode::Invoice,
            })
            .await?;
        info!(order_id = %receipt.order_id, invoice_url = ?receipt.invoice_url, "Invoice issued");

        if let Some(payment_id) = receipt.payment_id.clone() {
            let outcome = system.orders.on_payment_update(payment_id, "PAID".into()).await?;
            info!(?outcome, "Payment notification handled");
        }
        Ok::<_, order_fulfillment::order_workflow::OrderError>(receipt.order_id)
    }
    .instrument(span)
    .await;

    match invoice_order {
        Ok(order_id) => {
            // The resumed workflow runs behind the notification; give it a moment.
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            match system.orders.get_order(order_id).await {
                Ok(details) => info!(order_id = %details.order_id, status = %details.status, "Invoice order state"),
                Err(e) => error!(error = %e, "Invoice order lookup failed"),
            }
        }
        Err(e) => error!(error = %e, kind = %e.kind(), "Invoice order failed"),
    }

    match system.inventory.get_item(merchant_id, "i_001".into()).await {
        Ok(item) => info!(item_id = %item.item_id, stock = item.quantity, "Remaining stock"),
        Err(e) => error!(error = %e, "Stock lookup failed"),
    }

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
