//! Order placement atomicity against a real Postgres.
//!
//! Run with: cargo test -- --ignored --test-threads=1

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use smart_inventory_api::{
    entities::{order, order_item, order::OrderStatus},
    errors::ServiceError,
    services::{
        orders::{CreateOrder, NewOrderItem},
        products::CreateProduct,
    },
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
            price: dec!(10.00),
            quantity_in_stock: stock,
            supplier_id: None,
        })
        .await
        .expect("product created")
        .id
}

#[tokio::test]
#[ignore]
async fn order_decrements_stock_through_the_ledger() {
    let (db, services) = common::setup().await;
    common::truncate_all(&db).await;

    let product_id = seed_product(&services, "ORDER-OK", 10).await;

    let placed = services
        .orders
        .create_order(CreateOrder {
            customer_name: "Ada".into(),
            items: vec![NewOrderItem {
                product_id,
                quantity: 3,
            }],
        })
        .await
        .expect("order placed");

    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.items.len(), 1);

    let product = services.products.get_product(product_id).await.expect("get");
    assert_eq!(product.quantity_in_stock, 7);

    // Restock at creation plus the sale for the line item.
    let movements = services
        .ledger
        .movements_for_product(product_id, None, None)
        .await
        .expect("ledger");
    assert_eq!(movements.len(), 2);
    assert_eq!(movements.iter().map(|m| m.quantity_changed).sum::<i32>(), 7);
}

#[tokio::test]
#[ignore]
async fn failed_order_leaves_nothing_behind() {
    let (db, services) = common::setup().await;
    common::truncate_all(&db).await;

    let scarce = seed_product(&services, "ORDER-SCARCE", 3).await;
    let plenty = seed_product(&services, "ORDER-PLENTY", 50).await;

    // Second line overdraws; the whole order must roll back, including the
    // first line that would have succeeded alone.
    let err = services
        .orders
        .create_order(CreateOrder {
            customer_name: "Grace".into(),
            items: vec![
                NewOrderItem {
                    product_id: plenty,
                    quantity: 2,
                },
                NewOrderItem {
                    product_id: scarce,
                    quantity: 5,
                },
            ],
        })
        .await
        .expect_err("overdraw must fail the order");
    assert_matches!(err, ServiceError::InsufficientStock(_));

    assert_eq!(order::Entity::find().all(&*db).await.expect("orders").len(), 0);
    assert_eq!(
        order_item::Entity::find().all(&*db).await.expect("items").len(),
        0
    );

    for (product_id, expected_stock, expected_movements) in [(scarce, 3, 1), (plenty, 50, 1)] {
        let product = services.products.get_product(product_id).await.expect("get");
        assert_eq!(product.quantity_in_stock, expected_stock);
        let movements = services
            .ledger
            .movements_for_product(product_id, None, None)
            .await
            .expect("ledger");
        assert_eq!(movements.len(), expected_movements);
    }
}

#[tokio::test]
#[ignore]
async fn status_update_is_stored_without_transition_rules() {
    let (db, services) = common::setup().await;
    common::truncate_all(&db).await;

    let product_id = seed_product(&services, "ORDER-STATUS", 10).await;
    let placed = services
        .orders
        .create_order(CreateOrder {
            customer_name: "Edsger".into(),
            items: vec![NewOrderItem {
                product_id,
                quantity: 1,
            }],
        })
        .await
        .expect("order placed");

    let updated = services
        .orders
        .update_order_status(placed.order.id, OrderStatus::Completed)
        .await
        .expect("status stored");
    assert_eq!(updated.status, OrderStatus::Completed);

    // Any member of the closed set is storable, including "backwards".
    let reverted = services
        .orders
        .update_order_status(placed.order.id, OrderStatus::Pending)
        .await
        .expect("status stored again");
    assert_eq!(reverted.status, OrderStatus::Pending);
}
