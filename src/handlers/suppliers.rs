use super::common::{map_service_error, success_response, validate_input, ListParams};
use crate::{errors::ApiError, services::suppliers::CreateSupplier, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub contact_person: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub phone: Option<String>,
}

/// Create a new supplier
async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supplier = state
        .services
        .suppliers
        .create_supplier(CreateSupplier {
            name: payload.name,
            contact_person: payload.contact_person,
            email: payload.email,
            phone: payload.phone,
        })
        .await
        .map_err(map_service_error)?;

    info!("Supplier created: {}", supplier.id);

    Ok(success_response(supplier))
}

/// Get a supplier by ID
async fn get_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get_supplier(supplier_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

/// Retrieve suppliers with offset pagination
async fn list_suppliers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = state
        .services
        .suppliers
        .list_suppliers(params.skip, params.limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(suppliers))
}

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier))
        .route("/", get(list_suppliers))
        .route("/:id", get(get_supplier))
}
