//! Smart Inventory API Library
//!
//! Inventory and order management backend. The core is the range-partitioned
//! inventory movement ledger: segments are provisioned explicitly through the
//! maintenance surface, appends route to the matching segment, and stock
//! levels are derived from the ledger inside the appending transaction.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the Smart Inventory API"
    }))
}

/// The full HTTP surface, state not yet applied.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health::health))
        .nest("/products", handlers::products::product_routes())
        .nest("/suppliers", handlers::suppliers::supplier_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/inventory", handlers::inventory::inventory_routes())
        .nest("/maintenance", handlers::maintenance::maintenance_routes())
        .nest("/reports", handlers::reports::report_routes())
}
