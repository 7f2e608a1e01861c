use crate::{
    entities::supplier,
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct CreateSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplier,
    ) -> Result<supplier::Model, ServiceError> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "name must not be empty".into(),
            ));
        }

        let active = supplier::ActiveModel {
            name: Set(request.name),
            contact_person: Set(request.contact_person),
            email: Set(request.email.clone()),
            phone: Set(request.phone),
            ..Default::default()
        };

        let created = active.insert(&*self.db).await.map_err(|e| {
            if e.to_string()
                .contains("duplicate key value violates unique constraint")
            {
                ServiceError::Conflict(format!("email '{}' is already registered", request.email))
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        info!(supplier_id = created.id, "supplier created");
        if let Err(e) = self
            .event_sender
            .send(Event::SupplierCreated(created.id))
            .await
        {
            warn!(error = %e, supplier_id = created.id, "failed to send supplier event");
        }

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, supplier_id: i32) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(supplier_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))
    }

    /// Offset-paginated listing, stable by id.
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<supplier::Model>, ServiceError> {
        supplier::Entity::find()
            .order_by_asc(supplier::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
