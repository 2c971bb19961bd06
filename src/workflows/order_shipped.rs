use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::{Workflow, WorkflowStep};
use crate::container::Container;
use crate::db::Database;
use crate::error::StoreError;
use crate::models::customer::Order;
use crate::notifications::{Notification, NotificationProvider, TEMPLATE_ORDER_SHIPPED};

pub const ORDER_SHIPPED_WORKFLOW: &str = "order-shipped-notification";
const SHIPPED: &str = "shipped";

#[derive(Debug, Clone, Deserialize)]
pub struct OrderShippedInput {
    pub order_id: String,
    #[serde(default)]
    pub tracking_numbers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderShippedResult {
    pub order_id: String,
    pub notification_id: String,
}

pub struct OrderShippedContext {
    db: Arc<Database>,
    notifications: Arc<dyn NotificationProvider>,
    input: OrderShippedInput,
    order: Option<Order>,
    previous_status: Option<String>,
    shipment_ids: Vec<String>,
    notification_id: Option<String>,
}

impl OrderShippedContext {
    fn order(&self) -> Result<&Order, StoreError> {
        self.order
            .as_ref()
            .ok_or_else(|| StoreError::NotFound(format!("Order {} not loaded", self.input.order_id)))
    }
}

struct RetrieveOrderStep;

#[async_trait]
impl WorkflowStep<OrderShippedContext> for RetrieveOrderStep {
    fn name(&self) -> &'static str {
        "retrieve-order"
    }

    async fn invoke(&self, ctx: &mut OrderShippedContext) -> Result<(), StoreError> {
        let order = ctx
            .db
            .get_order(&ctx.input.order_id)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("Order with id {} was not found", ctx.input.order_id))
            })?;
        if order.fulfillment_status == SHIPPED {
            return Err(StoreError::NotAllowed(format!(
                "Order {} has already been shipped",
                order.id
            )));
        }
        ctx.order = Some(order);
        Ok(())
    }
}

struct MarkOrderShippedStep;

#[async_trait]
impl WorkflowStep<OrderShippedContext> for MarkOrderShippedStep {
    fn name(&self) -> &'static str {
        "mark-order-shipped"
    }

    async fn invoke(&self, ctx: &mut OrderShippedContext) -> Result<(), StoreError> {
        let order_id = ctx.order()?.id.clone();
        ctx.shipment_ids = ctx
            .db
            .add_shipments(&order_id, &ctx.input.tracking_numbers)
            .await?;
        ctx.previous_status = ctx.db.set_fulfillment_status(&order_id, SHIPPED).await?;
        Ok(())
    }

    async fn compensate(&self, ctx: &mut OrderShippedContext) -> Result<(), StoreError> {
        let order_id = ctx.order()?.id.clone();
        ctx.db.remove_shipments(&ctx.shipment_ids).await?;
        if let Some(previous) = ctx.previous_status.take() {
            ctx.db.set_fulfillment_status(&order_id, &previous).await?;
        }
        ctx.shipment_ids.clear();
        Ok(())
    }
}

struct SendShippingNotificationStep;

#[async_trait]
impl WorkflowStep<OrderShippedContext> for SendShippingNotificationStep {
    fn name(&self) -> &'static str {
        "send-shipping-notification"
    }

    async fn invoke(&self, ctx: &mut OrderShippedContext) -> Result<(), StoreError> {
        let order = ctx.order()?;
        let notification = Notification::email(
            &order.email,
            TEMPLATE_ORDER_SHIPPED,
            json!({
                "order_id": order.id,
                "order_display_id": order.display_id,
                "tracking_numbers": ctx.input.tracking_numbers,
            }),
        );
        let receipt = ctx.notifications.send(&notification).await?;
        ctx.notification_id = Some(receipt.id);
        Ok(())
    }
}

pub fn order_shipped_workflow() -> Workflow<OrderShippedContext> {
    Workflow::new(ORDER_SHIPPED_WORKFLOW)
        .step(RetrieveOrderStep)
        .step(MarkOrderShippedStep)
        .step(SendShippingNotificationStep)
}

pub async fn run_order_shipped(
    container: &Container,
    input: OrderShippedInput,
) -> Result<OrderShippedResult, StoreError> {
    let mut ctx = OrderShippedContext {
        db: container.db.clone(),
        notifications: container.notifications.clone(),
        input,
        order: None,
        previous_status: None,
        shipment_ids: Vec::new(),
        notification_id: None,
    };
    order_shipped_workflow().run(&mut ctx).await?;
    Ok(OrderShippedResult {
        order_id: ctx.input.order_id,
        notification_id: ctx.notification_id.unwrap_or_default(),
    })
}
