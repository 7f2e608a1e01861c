use super::common::{map_service_error, success_response, validate_input};
use crate::{
    entities::inventory_movement::MovementType, errors::ApiError, services::ledger::NewMovement,
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RecordMovementRequest {
    pub product_id: i32,
    pub quantity_changed: i32,
    pub movement_type: MovementType,
    /// Defaults to now; backdating routes the row to the matching segment.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Append a movement to the ledger
async fn record_movement(
    State(state): State<AppState>,
    Json(payload): Json<RecordMovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let movement = state
        .services
        .ledger
        .record_movement(NewMovement {
            product_id: payload.product_id,
            quantity_changed: payload.quantity_changed,
            movement_type: payload.movement_type,
            timestamp: payload.timestamp,
        })
        .await
        .map_err(map_service_error)?;

    info!(
        "Movement recorded: {} for product {}",
        movement.id, movement.product_id
    );

    Ok(success_response(movement))
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new().route("/movements", post(record_movement))
}
