use super::actions::{ShipmentAction, ShipmentActionResult, ShipmentQuery, ShipmentQueryResult};
use super::error::ShipmentError;
use super::ShipmentContext;
use crate::model::{OrderId, Shipment, ShipmentEvent, ShipmentId, ShipmentReceipt, ShipmentStatus, ShippingMethod, TrackingInfo};
use crate::persistence::ShipmentRow;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use durable_actor::{ActorEntity, Invocation, StepError};
use tracing::{info, warn};

#[async_trait]
impl ActorEntity for Shipment {
    type Key = ShipmentId;
    type Action = ShipmentAction;
    type ActionResult = ShipmentActionResult;
    type Query = ShipmentQuery;
    type QueryResult = ShipmentQueryResult;
    type Context = ShipmentContext;
    type Error = ShipmentError;
    const KIND: &'static str = "Shipment";

    async fn on_activate(&mut self, key: &ShipmentId, _ctx: &ShipmentContext) -> Result<(), ShipmentError> {
        self.shipment_id = key.clone();
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: ShipmentAction,
        inv: &Invocation<Self>,
        ctx: &ShipmentContext,
    ) -> Result<ShipmentActionResult, ShipmentError> {
        match action {
            ShipmentAction::CreateShipment { order_id, method } => self
                .create(order_id, method, inv, ctx)
                .await
                .map(ShipmentActionResult::CreateShipment),
            ShipmentAction::UpdateShipmentStatus { status, location } => {
                let key = inv.key();
                let current = self.status.ok_or_else(|| ShipmentError::NotFound(key.clone()))?;
                if status == current {
                    return Ok(ShipmentActionResult::UpdateShipmentStatus(self.tracking(key)?));
                }
                if !can_advance(current, status) {
                    return Err(ShipmentError::StateConflict {
                        shipment_id: key.clone(),
                        from: current,
                        to: status,
                    });
                }
                if !location.trim().is_empty() {
                    self.current_location = location;
                }
                self.status = Some(status);
                self.record_event(status);
                self.persist_best_effort(key, ctx).await;
                info!(shipment_id = %key, %status, location = %self.current_location, "Shipment status updated");
                Ok(ShipmentActionResult::UpdateShipmentStatus(self.tracking(key)?))
            }
        }
    }

    async fn handle_query(
        &self,
        query: ShipmentQuery,
        key: &ShipmentId,
        _ctx: &ShipmentContext,
    ) -> Result<ShipmentQueryResult, ShipmentError> {
        match query {
            ShipmentQuery::TrackShipment => self.tracking(key).map(ShipmentQueryResult::Tracking),
        }
    }
}

impl Shipment {
    async fn create(
        &mut self,
        order_id: OrderId,
        method: Option<ShippingMethod>,
        inv: &Invocation<Self>,
        ctx: &ShipmentContext,
    ) -> Result<ShipmentReceipt, ShipmentError> {
        let key = inv.key();
        if self.status.is_some() {
            info!(shipment_id = %key, tracking_number = %self.tracking_number, "Shipment already created");
            return Ok(self.receipt(key));
        }
        if order_id.is_empty() {
            return Err(ShipmentError::Validation("order_id is required".into()));
        }
        let method = method.unwrap_or_else(|| ShippingMethod {
            carrier: ctx.settings.carrier.clone(),
            service_type: ctx.settings.service_type.clone(),
        });
        if method.carrier.trim().is_empty() {
            return Err(ShipmentError::Validation("carrier is required".into()));
        }

        let suffix = inv.uuid()?.simple().to_string();
        let days = u64::from(ctx.settings.estimated_delivery_days);
        let estimate: Option<NaiveDate> = inv
            .run("estimate_delivery", || async move {
                Ok(Utc::now().date_naive().checked_add_days(Days::new(days)))
            })
            .await?;

        self.order_id = order_id;
        self.tracking_number = format!("TRACK-{}", suffix[..8].to_uppercase());
        self.carrier = method.carrier;
        self.service_type = method.service_type;
        self.current_location = ctx.settings.origin_location.clone();
        self.estimated_delivery = estimate;
        self.status = Some(ShipmentStatus::Created);
        self.record_event(ShipmentStatus::Created);

        let gateway = &ctx.gateway;
        let row = self.row(key);
        let row = &row;
        inv.run("persist_shipment", || async move {
            gateway.upsert_shipment(row).await.map_err(StepError::from)
        })
        .await?;

        info!(
            shipment_id = %key,
            order_id = %self.order_id,
            tracking_number = %self.tracking_number,
            carrier = %self.carrier,
            "Shipment created"
        );
        Ok(self.receipt(key))
    }

    fn record_event(&mut self, status: ShipmentStatus) {
        self.events.push(ShipmentEvent {
            status,
            location: self.current_location.clone(),
            at: Utc::now(),
        });
    }

    fn receipt(&self, key: &ShipmentId) -> ShipmentReceipt {
        ShipmentReceipt {
            shipment_id: key.clone(),
            tracking_number: self.tracking_number.clone(),
            estimated_delivery: self.estimated_delivery,
        }
    }

    fn tracking(&self, key: &ShipmentId) -> Result<TrackingInfo, ShipmentError> {
        let status = self.status.ok_or_else(|| ShipmentError::NotFound(key.clone()))?;
        Ok(TrackingInfo {
            shipment_id: key.clone(),
            tracking_number: self.tracking_number.clone(),
            carrier: self.carrier.clone(),
            status,
            current_location: self.current_location.clone(),
            estimated_delivery: self.estimated_delivery,
            events: self.events.clone(),
        })
    }

    fn row(&self, key: &ShipmentId) -> ShipmentRow {
        ShipmentRow {
            shipment_id: key.clone(),
            order_id: self.order_id.clone(),
            tracking_number: self.tracking_number.clone(),
            carrier: self.carrier.clone(),
            service_type: self.service_type.clone(),
            status: self.status.unwrap_or(ShipmentStatus::Created),
            current_location: self.current_location.clone(),
            estimated_delivery: self.estimated_delivery,
        }
    }

    async fn persist_best_effort(&self, key: &ShipmentId, ctx: &ShipmentContext) {
        if let Err(e) = ctx.gateway.upsert_shipment(&self.row(key)).await {
            warn!(entity_type = Self::KIND, %key, error = %e, "Shipment status not persisted");
        }
    }
}

fn can_advance(from: ShipmentStatus, to: ShipmentStatus) -> bool {
    matches!(
        (from, to),
        (ShipmentStatus::Created, ShipmentStatus::InTransit)
            | (ShipmentStatus::Created, ShipmentStatus::Delivered)
            | (ShipmentStatus::InTransit, ShipmentStatus::Delivered)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShipmentConfig;
    use crate::persistence::InMemoryGateway;
    use durable_actor::Substrate;
    use std::sync::Arc;

    fn context(gateway: Arc<InMemoryGateway>) -> ShipmentContext {
        ShipmentContext {
            gateway,
            settings: ShipmentConfig::default(),
        }
    }

    async fn create(shipment: &mut Shipment, ctx: &ShipmentContext) -> ShipmentReceipt {
        let inv = Invocation::<Shipment>::detached(ShipmentId::from("shp_1"), Substrate::new());
        match shipment
            .handle_action(
                ShipmentAction::CreateShipment {
                    order_id: OrderId::from("ord_1"),
                    method: None,
                },
                &inv,
                ctx,
            )
            .await
            .unwrap()
        {
            ShipmentActionResult::CreateShipment(receipt) => receipt,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let gateway = Arc::new(InMemoryGateway::new());
        let ctx = context(gateway.clone());
        let mut shipment = Shipment::default();

        let first = create(&mut shipment, &ctx).await;
        let second = create(&mut shipment, &ctx).await;

        assert_eq!(first, second);
        assert!(first.tracking_number.starts_with("TRACK-"));
        assert_eq!(first.tracking_number.len(), "TRACK-".len() + 8);
        assert_eq!(gateway.shipment_rows_for_order(&OrderId::from("ord_1")), 1);
        assert_eq!(shipment.events.len(), 1);
    }

    #[tokio::test]
    async fn estimate_is_configured_days_from_today() {
        let ctx = context(Arc::new(InMemoryGateway::new()));
        let mut shipment = Shipment::default();

        let receipt = create(&mut shipment, &ctx).await;

        let expected = Utc::now().date_naive().checked_add_days(Days::new(5));
        assert_eq!(receipt.estimated_delivery, expected);
        assert_eq!(shipment.current_location, "Warehouse");
        assert_eq!(shipment.carrier, "FedEx");
    }

    #[tokio::test]
    async fn status_cannot_move_backwards() {
        let ctx = context(Arc::new(InMemoryGateway::new()));
        let mut shipment = Shipment::default();
        create(&mut shipment, &ctx).await;
        let inv = Invocation::<Shipment>::detached(ShipmentId::from("shp_1"), Substrate::new());

        shipment
            .handle_action(
                ShipmentAction::UpdateShipmentStatus {
                    status: ShipmentStatus::Delivered,
                    location: "Customer".into(),
                },
                &inv,
                &ctx,
            )
            .await
            .unwrap();
        let err = shipment
            .handle_action(
                ShipmentAction::UpdateShipmentStatus {
                    status: ShipmentStatus::InTransit,
                    location: String::new(),
                },
                &inv,
                &ctx,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ShipmentError::StateConflict { .. }));
        assert_eq!(shipment.current_location, "Customer");
    }

    #[tokio::test]
    async fn tracking_an_unknown_shipment_is_not_found() {
        let ctx = context(Arc::new(InMemoryGateway::new()));
        let err = Shipment::default()
            .handle_query(ShipmentQuery::TrackShipment, &ShipmentId::from("shp_x"), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err, ShipmentError::NotFound(ShipmentId::from("shp_x")));
    }
}
