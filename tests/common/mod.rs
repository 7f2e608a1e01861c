#![allow(dead_code)]

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use smart_inventory_api::{db, events::EventSender, handlers::AppServices};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connect to the database named by DATABASE_URL, run migrations and build
/// the service stack. Integration tests need a real Postgres; they are
/// `#[ignore]`d by default and meant to run single-threaded:
///
///   cargo test -- --ignored --test-threads=1
pub async fn setup() -> (Arc<DatabaseConnection>, AppServices) {
    let url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    let db_arc = Arc::new(pool);
    let (tx, rx) = mpsc::channel(1024);
    tokio::spawn(smart_inventory_api::events::process_events(rx));
    let services = AppServices::new(db_arc.clone(), EventSender::new(tx));
    (db_arc, services)
}

pub async fn truncate_all(db: &DatabaseConnection) {
    db.execute_unprepared(
        "TRUNCATE TABLE order_items, \"order\", inventory_movement, product, supplier \
         RESTART IDENTITY CASCADE",
    )
    .await
    .expect("truncate");
}

pub async fn drop_partition(db: &DatabaseConnection, name: &str) {
    db.execute_unprepared(&format!("DROP TABLE IF EXISTS {};", name))
        .await
        .expect("drop partition");
}

/// Row count of one ledger segment for a product, bypassing the logical
/// table on purpose.
pub async fn segment_rows_for_product(
    db: &DatabaseConnection,
    segment: &str,
    product_id: i32,
) -> i64 {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        format!(
            "SELECT COUNT(*) AS cnt FROM {} WHERE product_id = $1",
            segment
        ),
        [product_id.into()],
    );
    let row = db
        .query_one(stmt)
        .await
        .expect("segment scan")
        .expect("count row");
    row.try_get("", "cnt").expect("cnt column")
}
