//! Ledger append/query behavior against a real Postgres.
//!
//! Run with: cargo test -- --ignored --test-threads=1

mod common;

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use smart_inventory_api::{
    entities::inventory_movement::{self, MovementType},
    errors::ServiceError,
    services::{ledger::NewMovement, products::CreateProduct},
};

async fn seed_product(
    services: &smart_inventory_api::handlers::AppServices,
    sku: &str,
    stock: i32,
) -> i32 {
    services
        .products
        .create_product(CreateProduct {
            sku: sku.into(),
            name: format!("Test product {}", sku),
            description: None,
            price: dec!(19.99),
            quantity_in_stock: stock,
            supplier_id: None,
        })
        .await
        .expect("product created")
        .id
}

#[tokio::test]
#[ignore]
async fn movement_is_routed_to_its_year_segment() {
    let (db, services) = common::setup().await;
    common::truncate_all(&db).await;

    let product_id = seed_product(&services, "ROUTE-1", 0).await;

    let ts = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    services
        .ledger
        .record_movement(NewMovement {
            product_id,
            quantity_changed: 25,
            movement_type: MovementType::Restock,
            timestamp: Some(ts),
        })
        .await
        .expect("backdated restock");

    // Present in the 2024 segment's direct scan, absent from 2025's.
    assert_eq!(
        common::segment_rows_for_product(&db, "inventory_movement_y2024", product_id).await,
        1
    );
    assert_eq!(
        common::segment_rows_for_product(&db, "inventory_movement_y2025", product_id).await,
        0
    );

    // The windowed logical query finds it; a disjoint window does not.
    let in_window = services
        .ledger
        .movements_for_product(
            product_id,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        )
        .await
        .expect("windowed query");
    assert_eq!(in_window.len(), 1);
    assert_eq!(in_window[0].quantity_changed, 25);

    let out_of_window = services
        .ledger
        .movements_for_product(
            product_id,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            None,
        )
        .await
        .expect("disjoint window");
    assert!(out_of_window.is_empty());
}

#[tokio::test]
#[ignore]
async fn movements_are_returned_time_ordered_regardless_of_insertion_order() {
    let (db, services) = common::setup().await;
    common::truncate_all(&db).await;

    let product_id = seed_product(&services, "ORDERED-1", 0).await;

    // Insert newest first; backdating is allowed.
    for (year, qty) in [(2025, 30), (2024, 10)] {
        services
            .ledger
            .record_movement(NewMovement {
                product_id,
                quantity_changed: qty,
                movement_type: MovementType::Restock,
                timestamp: Some(Utc.with_ymd_and_hms(year, 3, 1, 0, 0, 0).unwrap()),
            })
            .await
            .expect("restock");
    }

    let movements = services
        .ledger
        .movements_for_product(product_id, None, None)
        .await
        .expect("query");
    let stamps: Vec<_> = movements.iter().map(|m| m.timestamp).collect();
    let mut sorted = stamps.clone();
    sorted.sort();
    assert_eq!(stamps, sorted, "explicitly time-ordered");
}

#[tokio::test]
#[ignore]
async fn unknown_product_is_rejected_with_no_partial_row() {
    let (db, services) = common::setup().await;
    common::truncate_all(&db).await;

    let missing_product = 999_999;
    let err = services
        .ledger
        .record_movement(NewMovement {
            product_id: missing_product,
            quantity_changed: 5,
            movement_type: MovementType::Restock,
            timestamp: None,
        })
        .await
        .expect_err("append must be rejected");
    assert_matches!(err, ServiceError::ForeignKeyViolation(_));

    let rows = inventory_movement::Entity::find()
        .filter(inventory_movement::Column::ProductId.eq(missing_product))
        .all(&*db)
        .await
        .expect("scan");
    assert!(rows.is_empty(), "no partial row may stay visible");
}

#[tokio::test]
#[ignore]
async fn timestamp_outside_all_segments_fails_hard() {
    let (db, services) = common::setup().await;
    common::truncate_all(&db).await;
    common::drop_partition(&db, "inventory_movement_y2045").await;

    let product_id = seed_product(&services, "NOPART-1", 0).await;

    let err = services
        .ledger
        .record_movement(NewMovement {
            product_id,
            quantity_changed: 5,
            movement_type: MovementType::Restock,
            timestamp: Some(Utc.with_ymd_and_hms(2045, 2, 1, 0, 0, 0).unwrap()),
        })
        .await
        .expect_err("segment creation is an administrative act, never implicit");
    assert_matches!(err, ServiceError::NoMatchingPartition(_));

    let product = services.products.get_product(product_id).await.expect("get");
    assert_eq!(product.quantity_in_stock, 0, "stock untouched by the failed append");
}

#[tokio::test]
#[ignore]
async fn overdraw_is_rejected_atomically() {
    let (db, services) = common::setup().await;
    common::truncate_all(&db).await;

    let product_id = seed_product(&services, "OVERDRAW-1", 5).await;

    let err = services
        .ledger
        .record_movement(NewMovement {
            product_id,
            quantity_changed: -10,
            movement_type: MovementType::Sale,
            timestamp: None,
        })
        .await
        .expect_err("overdraw must be rejected");
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let product = services.products.get_product(product_id).await.expect("get");
    assert_eq!(product.quantity_in_stock, 5);

    let movements = services
        .ledger
        .movements_for_product(product_id, None, None)
        .await
        .expect("query");
    assert_eq!(movements.len(), 1, "only the seeding restock is on the ledger");
}
