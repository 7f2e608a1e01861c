use crate::{
    entities::{inventory_movement::MovementType, product, supplier},
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity_in_stock: i32,
    pub supplier_id: Option<i32>,
}

/// Service for the product catalog.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a product. The row starts at zero stock; a non-zero initial
    /// quantity enters through a restock movement in the same transaction,
    /// so even the first stock level is ledger-derived.
    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProduct,
    ) -> Result<product::Model, ServiceError> {
        if request.sku.trim().is_empty() {
            return Err(ServiceError::ValidationError("sku must not be empty".into()));
        }
        if request.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "name must not be empty".into(),
            ));
        }
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".into(),
            ));
        }
        if request.quantity_in_stock < 0 {
            return Err(ServiceError::ValidationError(
                "quantity_in_stock must not be negative".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::DatabaseError)?;

        if let Some(supplier_id) = request.supplier_id {
            let exists = supplier::Entity::find_by_id(supplier_id)
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .is_some();
            if !exists {
                return Err(ServiceError::ForeignKeyViolation(format!(
                    "supplier {} does not exist",
                    supplier_id
                )));
            }
        }

        let active = product::ActiveModel {
            sku: Set(request.sku.clone()),
            name: Set(request.name.clone()),
            description: Set(request.description.clone()),
            price: Set(request.price),
            quantity_in_stock: Set(0),
            supplier_id: Set(request.supplier_id),
            ..Default::default()
        };

        let mut created = active.insert(&txn).await.map_err(|e| {
            if e.to_string()
                .contains("duplicate key value violates unique constraint")
            {
                ServiceError::Conflict(format!("sku '{}' already exists", request.sku))
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        if request.quantity_in_stock > 0 {
            let movement = ledger::NewMovement {
                product_id: created.id,
                quantity_changed: request.quantity_in_stock,
                movement_type: MovementType::Restock,
                timestamp: None,
            };
            ledger::record_movement_in(&txn, &movement).await?;
            created.quantity_in_stock = request.quantity_in_stock;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(product_id = created.id, sku = %created.sku, "product created");
        if let Err(e) = self.event_sender.send(Event::ProductCreated(created.id)).await {
            warn!(error = %e, product_id = created.id, "failed to send product event");
        }

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Products whose stock level sits below `threshold`.
    #[instrument(skip(self))]
    pub async fn low_stock_products(
        &self,
        threshold: i32,
    ) -> Result<Vec<product::Model>, ServiceError> {
        product::Entity::find()
            .filter(product::Column::QuantityInStock.lt(threshold))
            .order_by_asc(product::Column::QuantityInStock)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
