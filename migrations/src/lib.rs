pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_supplier_table;
mod m20250601_000002_create_product_table;
mod m20250601_000003_create_order_table;
mod m20250601_000004_create_order_items_table;
mod m20250608_000005_create_partitioned_inventory_movement;
mod m20250608_000006_create_stock_valuation_view;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_supplier_table::Migration),
            Box::new(m20250601_000002_create_product_table::Migration),
            Box::new(m20250601_000003_create_order_table::Migration),
            Box::new(m20250601_000004_create_order_items_table::Migration),
            Box::new(m20250608_000005_create_partitioned_inventory_movement::Migration),
            Box::new(m20250608_000006_create_stock_valuation_view::Migration),
        ]
    }
}
