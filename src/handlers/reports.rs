use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

/// Per-product valuation from the live view
async fn stock_valuation(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .reports
        .stock_valuation()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(rows))
}

/// Pending-order counts grouped by supplier. Suppliers with no pending
/// orders are omitted.
async fn pending_orders_by_supplier(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .reports
        .pending_orders_by_supplier()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(rows))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/stock-valuation", get(stock_valuation))
        .route(
            "/pending-orders-by-supplier",
            get(pending_orders_by_supplier),
        )
}
