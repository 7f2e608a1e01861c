//! Movement Ledger Store: append-only, range-partitioned storage of
//! inventory movements. Every stock change goes through here — the product's
//! `quantity_in_stock` is derived from the appended delta inside the same
//! transaction, so ledger and stock cannot drift.

use crate::{
    entities::{
        inventory_movement::{self, MovementType},
        product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveEnum, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};

/// A movement to append. `timestamp` defaults to now; backdating is allowed
/// (historical loads), the store routes the row to the matching segment.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: i32,
    pub quantity_changed: i32,
    pub movement_type: MovementType,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewMovement {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.quantity_changed == 0 {
            return Err(ServiceError::ValidationError(
                "quantity_changed must be non-zero".into(),
            ));
        }
        let sign = self.quantity_changed.signum();
        match self.movement_type.expected_sign() {
            0 => {}
            expected if expected != sign => {
                return Err(ServiceError::ValidationError(format!(
                    "{} movements must carry a {} quantity delta",
                    self.movement_type,
                    if expected > 0 { "positive" } else { "negative" },
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Classify a storage error raised while inserting a ledger row.
///
/// Postgres reports a timestamp outside every provisioned segment as
/// "no partition of relation ... found for row", and a missing product as a
/// foreign key violation; both are business outcomes here, not 500s.
fn classify_append_error(err: DbErr, movement: &NewMovement) -> ServiceError {
    let msg = err.to_string();
    if msg.contains("no partition of relation") {
        ServiceError::NoMatchingPartition(format!(
            "no ledger segment covers timestamp {}; provision the partition first",
            movement
                .timestamp
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_else(|| "now".into()),
        ))
    } else if msg.contains("violates foreign key constraint") {
        ServiceError::ForeignKeyViolation(format!(
            "product {} does not exist",
            movement.product_id
        ))
    } else {
        ServiceError::DatabaseError(err)
    }
}

/// Append a movement inside the caller's transaction and derive the new
/// stock level from the delta. Used directly by [`LedgerService`] and
/// composed by order placement so line items, stock and ledger commit as one
/// unit.
pub async fn record_movement_in<C: ConnectionTrait>(
    conn: &C,
    movement: &NewMovement,
) -> Result<inventory_movement::Model, ServiceError> {
    movement.validate()?;

    // Lock the product row for the duration of the transaction; concurrent
    // appends for the same product serialize here.
    let found = product::Entity::find_by_id(movement.product_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    let Some(existing) = found else {
        return Err(ServiceError::ForeignKeyViolation(format!(
            "product {} does not exist",
            movement.product_id
        )));
    };

    let new_quantity = existing.quantity_in_stock + movement.quantity_changed;
    if new_quantity < 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "product {} has {} in stock, movement of {} would overdraw it",
            existing.sku, existing.quantity_in_stock, movement.quantity_changed,
        )));
    }

    let timestamp = movement.timestamp.unwrap_or_else(Utc::now);

    // Raw insert: the composite (id, timestamp) key takes its id from the
    // global sequence, so we let the store generate it and read it back.
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"INSERT INTO inventory_movement
               (product_id, quantity_changed, movement_type, "timestamp")
           VALUES ($1, $2, $3, $4)
           RETURNING id"#,
        [
            movement.product_id.into(),
            movement.quantity_changed.into(),
            movement.movement_type.to_value().into(),
            timestamp.into(),
        ],
    );

    let row = conn
        .query_one(stmt)
        .await
        .map_err(|e| classify_append_error(e, movement))?
        .ok_or_else(|| {
            ServiceError::InternalError("movement insert returned no row".into())
        })?;
    let id: i64 = row.try_get("", "id").map_err(ServiceError::DatabaseError)?;

    let mut active: product::ActiveModel = existing.into();
    active.quantity_in_stock = Set(new_quantity);
    active.update(conn).await.map_err(ServiceError::DatabaseError)?;

    Ok(inventory_movement::Model {
        id,
        product_id: movement.product_id,
        quantity_changed: movement.quantity_changed,
        movement_type: movement.movement_type.clone(),
        timestamp,
    })
}

/// Service facade over the movement ledger.
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl LedgerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Appends a movement in its own transaction. Any failure (unknown
    /// product, overdraw, unprovisioned segment) rolls back fully; no
    /// partial row stays visible.
    #[instrument(skip(self))]
    pub async fn record_movement(
        &self,
        movement: NewMovement,
    ) -> Result<inventory_movement::Model, ServiceError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(ServiceError::DatabaseError)?;

        let recorded = match record_movement_in(&txn, &movement).await {
            Ok(model) => model,
            Err(err) => {
                // Rollback is best-effort; dropping the txn rolls back too.
                if let Err(rb) = txn.rollback().await {
                    warn!(error = %rb, "rollback after failed movement append failed");
                }
                return Err(err);
            }
        };

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::MovementRecorded {
                movement_id: recorded.id,
                product_id: recorded.product_id,
                movement_type: recorded.movement_type.clone(),
                quantity_changed: recorded.quantity_changed,
            })
            .await
        {
            warn!(error = %e, movement_id = recorded.id, "failed to send movement event");
        }

        Ok(recorded)
    }

    /// Movements for one product within an optional half-open `[from, until)`
    /// window, ordered by timestamp. The range predicate is what lets the
    /// store prune segments; storage order is never relied upon.
    #[instrument(skip(self))]
    pub async fn movements_for_product(
        &self,
        product_id: i32,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<inventory_movement::Model>, ServiceError> {
        let mut query = inventory_movement::Entity::find()
            .filter(inventory_movement::Column::ProductId.eq(product_id));

        if let Some(from) = from {
            query = query.filter(inventory_movement::Column::Timestamp.gte(from));
        }
        if let Some(until) = until {
            query = query.filter(inventory_movement::Column::Timestamp.lt(until));
        }

        query
            .order_by_asc(inventory_movement::Column::Timestamp)
            .order_by_asc(inventory_movement::Column::Id)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn movement(kind: MovementType, delta: i32) -> NewMovement {
        NewMovement {
            product_id: 1,
            quantity_changed: delta,
            movement_type: kind,
            timestamp: None,
        }
    }

    #[test]
    fn zero_delta_is_rejected() {
        assert_matches!(
            movement(MovementType::Adjustment, 0).validate(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[rstest]
    #[case(MovementType::Restock, -5)]
    #[case(MovementType::Return, -1)]
    #[case(MovementType::Sale, 3)]
    fn sign_mismatch_is_rejected(#[case] kind: MovementType, #[case] delta: i32) {
        assert_matches!(
            movement(kind, delta).validate(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[rstest]
    #[case(MovementType::Restock, 10)]
    #[case(MovementType::Return, 2)]
    #[case(MovementType::Sale, -4)]
    #[case(MovementType::Adjustment, -7)]
    #[case(MovementType::Adjustment, 7)]
    fn valid_deltas_pass(#[case] kind: MovementType, #[case] delta: i32) {
        assert!(movement(kind, delta).validate().is_ok());
    }

    #[test]
    fn missing_segment_maps_to_no_matching_partition() {
        let err = DbErr::Custom(
            "Execution Error: error returned from database: no partition of relation \
             \"inventory_movement\" found for row"
                .into(),
        );
        assert_matches!(
            classify_append_error(err, &movement(MovementType::Sale, -1)),
            ServiceError::NoMatchingPartition(_)
        );
    }

    #[test]
    fn fk_failure_maps_to_foreign_key_violation() {
        let err = DbErr::Custom(
            "Execution Error: error returned from database: insert or update on table \
             \"inventory_movement\" violates foreign key constraint \
             \"fk_inventory_movement_product_id\""
                .into(),
        );
        assert_matches!(
            classify_append_error(err, &movement(MovementType::Restock, 1)),
            ServiceError::ForeignKeyViolation(_)
        );
    }

    #[test]
    fn unrelated_errors_stay_database_errors() {
        let err = DbErr::Custom("connection reset by peer".into());
        assert_matches!(
            classify_append_error(err, &movement(MovementType::Restock, 1)),
            ServiceError::DatabaseError(_)
        );
    }
}
