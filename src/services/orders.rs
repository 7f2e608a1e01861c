use crate::{
    entities::{
        inventory_movement::MovementType,
        order::{self, OrderStatus},
        order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_name: String,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct OrderWithItems {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Service for order placement and status storage.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Places an order. Order row, line items, sale movements and stock
    /// decrements commit as one transaction; an unknown product, an
    /// overdraw or an unprovisioned ledger segment rolls everything back.
    #[instrument(skip(self, request), fields(customer = %request.customer_name))]
    pub async fn create_order(
        &self,
        request: CreateOrder,
    ) -> Result<OrderWithItems, ServiceError> {
        if request.customer_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "customer_name must not be empty".into(),
            ));
        }
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "quantity for product {} must be positive",
                    item.product_id
                )));
            }
        }

        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order_model = order::ActiveModel {
            customer_name: Set(request.customer_name),
            status: Set(OrderStatus::Pending),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            // The claim against stock is recorded in the ledger; the item row
            // only carries the order line.
            let movement = ledger::NewMovement {
                product_id: item.product_id,
                quantity_changed: -item.quantity,
                movement_type: MovementType::Sale,
                timestamp: None,
            };
            ledger::record_movement_in(&txn, &movement).await?;

            let item_model = order_item::ActiveModel {
                order_id: Set(order_model.id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
            items.push(item_model);
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(order_id = order_model.id, items = items.len(), "order created");
        if let Err(e) = self
            .event_sender
            .send(Event::OrderCreated(order_model.id))
            .await
        {
            warn!(error = %e, order_id = order_model.id, "failed to send order event");
        }

        Ok(OrderWithItems {
            order: order_model,
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderWithItems, ServiceError> {
        let order_model = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = order_model
            .find_related(order_item::Entity)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(OrderWithItems {
            order: order_model,
            items,
        })
    }

    /// Stores a new status. The status set is closed; transitions are not
    /// validated here.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: i32,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let order_model = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order_model.status.clone();
        let mut active: order::ActiveModel = order_model.into();
        active.status = Set(new_status.clone());
        let updated = active
            .update(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(order_id, %old_status, %new_status, "order status updated");
        if let Err(e) = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            })
            .await
        {
            warn!(error = %e, order_id, "failed to send status event");
        }

        Ok(updated)
    }
}
