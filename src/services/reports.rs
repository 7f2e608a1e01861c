//! Read-only reporting projections. Both queries operate against the logical
//! ledger/catalog and are recomputed per call — they are never a source of
//! truth and never cached.

use crate::{
    entities::{
        order::{self, OrderStatus},
        order_item, product, supplier,
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Statement,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// One row of `vw_stock_valuation`.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct StockValuationRow {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub quantity_in_stock: i32,
    pub valuation: Decimal,
}

/// Pending-order count for one supplier. Inner-join semantics: suppliers
/// with no pending orders do not appear; absence means zero.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct SupplierPendingOrders {
    pub supplier_id: i32,
    pub supplier_name: String,
    pub pending_orders_count: i64,
}

#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Per-product valuation (`price * quantity_in_stock`) straight from the
    /// view, reflecting the last committed write.
    #[instrument(skip(self))]
    pub async fn stock_valuation(&self) -> Result<Vec<StockValuationRow>, ServiceError> {
        StockValuationRow::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            "SELECT id, name, sku, price, quantity_in_stock, valuation \
             FROM vw_stock_valuation ORDER BY id",
        ))
        .all(&*self.db)
        .await
        .map_err(ServiceError::DatabaseError)
    }

    /// Distinct pending orders per supplier, traversing
    /// supplier → product → order_items → order. Every hop is an explicit
    /// inner join over a declared relation; an order counts once per
    /// supplier no matter how many of its lines the supplier covers.
    #[instrument(skip(self))]
    pub async fn pending_orders_by_supplier(
        &self,
    ) -> Result<Vec<SupplierPendingOrders>, ServiceError> {
        supplier::Entity::find()
            .select_only()
            .column_as(supplier::Column::Id, "supplier_id")
            .column_as(supplier::Column::Name, "supplier_name")
            .column_as(
                Expr::expr(Func::count_distinct(Expr::col((order::Entity, order::Column::Id)))),
                "pending_orders_count",
            )
            .join(JoinType::InnerJoin, supplier::Relation::Product.def())
            .join(JoinType::InnerJoin, product::Relation::OrderItem.def())
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order::Column::Status.eq(OrderStatus::Pending))
            .group_by(supplier::Column::Id)
            .group_by(supplier::Column::Name)
            .order_by_asc(supplier::Column::Name)
            .into_model::<SupplierPendingOrders>()
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
