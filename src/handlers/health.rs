use super::common::{map_service_error, success_response};
use crate::{db, errors::ApiError, AppState};
use axum::{extract::State, response::IntoResponse};

/// Liveness plus a storage round-trip.
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    db::check_connection(&state.db)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({ "status": "ok" })))
}
