use super::common::{map_service_error, success_response, validate_input};
use crate::{errors::ApiError, services::products::CreateProduct, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "sku must not be empty"))]
    pub sku: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, message = "quantity_in_stock must not be negative"))]
    pub quantity_in_stock: i32,
    pub supplier_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    #[serde(default = "default_threshold")]
    pub threshold: i32,
}

fn default_threshold() -> i32 {
    10
}

/// Optional half-open `[from, until)` window for ledger queries.
#[derive(Debug, Deserialize)]
pub struct MovementWindow {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

/// Create a new product
async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .create_product(CreateProduct {
            sku: payload.sku,
            name: payload.name,
            description: payload.description,
            price: payload.price,
            quantity_in_stock: payload.quantity_in_stock,
            supplier_id: payload.supplier_id,
        })
        .await
        .map_err(map_service_error)?;

    info!("Product created: {}", product.id);

    Ok(success_response(product))
}

/// Get a product by ID
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

/// List products whose stock sits below the threshold
async fn low_stock_products(
    State(state): State<AppState>,
    Query(params): Query<LowStockParams>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .low_stock_products(params.threshold)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Ledger movements for a product, time-ordered, optionally windowed
async fn product_movements(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Query(window): Query<MovementWindow>,
) -> Result<impl IntoResponse, ApiError> {
    // 404 for an unknown product, like the other product reads.
    state
        .services
        .products
        .get_product(product_id)
        .await
        .map_err(map_service_error)?;

    let movements = state
        .services
        .ledger
        .movements_for_product(product_id, window.from, window.until)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(movements))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product))
        .route("/low-stock", get(low_stock_products))
        .route("/:id", get(get_product))
        .route("/:id/movements", get(product_movements))
}
