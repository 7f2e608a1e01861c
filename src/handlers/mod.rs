pub mod common;
pub mod health;
pub mod inventory;
pub mod maintenance;
pub mod orders;
pub mod products;
pub mod reports;
pub mod suppliers;

use crate::{
    events::EventSender,
    services::{
        ledger::LedgerService, orders::OrderService, partitions::PartitionService,
        products::ProductService, reports::ReportService, suppliers::SupplierService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub suppliers: SupplierService,
    pub orders: OrderService,
    pub ledger: LedgerService,
    pub partitions: PartitionService,
    pub reports: ReportService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            products: ProductService::new(db.clone(), event_sender.clone()),
            suppliers: SupplierService::new(db.clone(), event_sender.clone()),
            orders: OrderService::new(db.clone(), event_sender.clone()),
            ledger: LedgerService::new(db.clone(), event_sender.clone()),
            partitions: PartitionService::new(db.clone(), event_sender),
            reports: ReportService::new(db),
        }
    }
}
