use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    services::partitions::{partition_name, ProvisionOutcome},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

// This endpoint must sit behind the gateway's admin protection; the core
// itself carries no authorization.

#[derive(Debug, Deserialize, Validate)]
pub struct PartitionCreateRequest {
    /// The year to create an inventory partition for (e.g., 2026).
    #[validate(range(min = 2020, max = 2050))]
    pub year: i32,
}

/// Create a new partition of the inventory movement ledger for a given year.
/// Idempotent: re-running for a provisioned year succeeds.
async fn create_inventory_partition(
    State(state): State<AppState>,
    Json(payload): Json<PartitionCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .partitions
        .ensure_partition(payload.year)
        .await
        .map_err(map_service_error)?;

    info!("Partition ensured for year {}: {:?}", payload.year, outcome);

    Ok(created_response(serde_json::json!({
        "status": "success",
        "outcome": outcome,
        "message": match outcome {
            ProvisionOutcome::Created => {
                format!("Partition '{}' created.", partition_name(payload.year))
            }
            ProvisionOutcome::AlreadyExists => {
                format!("Partition '{}' already exists.", partition_name(payload.year))
            }
        },
    })))
}

/// List the segments currently attached to the ledger
async fn list_inventory_partitions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let partitions = state
        .services
        .partitions
        .list_partitions()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(partitions))
}

pub fn maintenance_routes() -> Router<AppState> {
    Router::new().route(
        "/partitions/inventory",
        post(create_inventory_partition).get(list_inventory_partitions),
    )
}
