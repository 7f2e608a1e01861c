//! Seed data script - populates the database with realistic demo data
//!
//! Run with: cargo run --bin seed-data -- --suppliers 50 --products 500 --orders 2000
//!
//! Every stock level enters through the movement ledger: products are created
//! empty and restocked with backdated movements (which exercises partition
//! routing), then orders are placed through the order service.

use chrono::{Datelike, Duration, Utc};
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use smart_inventory_api::{
    config, db,
    entities::{inventory_movement::MovementType, order::OrderStatus},
    errors::ServiceError,
    events::{process_events, EventSender},
    handlers::AppServices,
    services::{
        ledger::NewMovement,
        orders::{CreateOrder, NewOrderItem},
        products::CreateProduct,
        suppliers::CreateSupplier,
    },
};

#[derive(Parser, Debug)]
#[command(about = "Seed the database with test data")]
struct Args {
    /// Delete all existing data before seeding
    #[arg(long)]
    clean: bool,

    /// Number of suppliers to create
    #[arg(long, default_value_t = 50)]
    suppliers: usize,

    /// Number of products to create
    #[arg(long, default_value_t = 500)]
    products: usize,

    /// Number of orders to create
    #[arg(long, default_value_t = 2000)]
    orders: usize,
}

const COMPANY_STEMS: &[&str] = &[
    "Northwind", "Acme", "Globex", "Initech", "Umbra", "Vandelay", "Cyberdyne", "Stark",
    "Wayne", "Tyrell", "Aperture", "Hooli",
];
const COMPANY_SUFFIXES: &[&str] = &["Trading", "Logistics", "Supplies", "Industries", "Wholesale"];
const PRODUCT_ADJECTIVES: &[&str] = &[
    "Rustic", "Sleek", "Ergonomic", "Durable", "Compact", "Premium", "Practical", "Refined",
];
const PRODUCT_MATERIALS: &[&str] = &["Steel", "Wooden", "Cotton", "Granite", "Aluminum", "Leather"];
const PRODUCT_ITEMS: &[&str] = &[
    "Chair", "Lamp", "Keyboard", "Bottle", "Backpack", "Notebook", "Headset", "Mug", "Shelf",
    "Cable",
];
const FIRST_NAMES: &[&str] = &[
    "Alex", "Sam", "Jordan", "Casey", "Robin", "Taylor", "Morgan", "Jamie", "Riley", "Quinn",
];
const LAST_NAMES: &[&str] = &[
    "Lee", "Garcia", "Chen", "Patel", "Novak", "Kim", "Mueller", "Silva", "Haber", "Okafor",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let cfg = config::load_config()?;
    info!("Connecting to database: {}", cfg.postgres_db);
    let pool = db::establish_connection_from_app_config(&cfg).await?;
    db::run_migrations(&pool).await?;

    let db_arc = Arc::new(pool);
    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = EventSender::new(event_tx);
    tokio::spawn(process_events(event_rx));

    let services = AppServices::new(db_arc.clone(), event_sender);

    if args.clean {
        clean_data(&db_arc).await?;
    }

    // Backdated restocks land one to two years in the past; make sure those
    // segments and the current one exist before appending.
    let current_year = Utc::now().year();
    for year in (current_year - 2)..=current_year {
        let outcome = services.partitions.ensure_partition(year).await?;
        info!("Ledger segment for {}: {:?}", year, outcome);
    }

    info!("Seeding {} suppliers...", args.suppliers);
    let mut supplier_ids = Vec::with_capacity(args.suppliers);
    for i in 0..args.suppliers {
        let mut rng = rand::thread_rng();
        let name = format!(
            "{} {} #{}",
            COMPANY_STEMS.choose(&mut rng).unwrap_or(&"Acme"),
            COMPANY_SUFFIXES.choose(&mut rng).unwrap_or(&"Trading"),
            i + 1,
        );
        let contact = format!(
            "{} {}",
            FIRST_NAMES.choose(&mut rng).unwrap_or(&"Alex"),
            LAST_NAMES.choose(&mut rng).unwrap_or(&"Lee"),
        );
        drop(rng);

        let supplier = services
            .suppliers
            .create_supplier(CreateSupplier {
                name,
                contact_person: Some(contact),
                email: format!("purchasing+{}@seed.example.com", i + 1),
                phone: Some(format!("+1-555-{:04}", i + 1)),
            })
            .await?;
        supplier_ids.push(supplier.id);
    }
    info!("Created {} suppliers", supplier_ids.len());

    info!("Seeding {} products with initial inventory...", args.products);
    let mut product_ids = Vec::with_capacity(args.products);
    for i in 0..args.products {
        let (name, price_cents, initial_stock, supplier_id, backdate_days) = {
            let mut rng = rand::thread_rng();
            (
                format!(
                    "{} {} {}",
                    PRODUCT_ADJECTIVES.choose(&mut rng).unwrap_or(&"Practical"),
                    PRODUCT_MATERIALS.choose(&mut rng).unwrap_or(&"Steel"),
                    PRODUCT_ITEMS.choose(&mut rng).unwrap_or(&"Chair"),
                ),
                rng.gen_range(1099..99_999i64),
                rng.gen_range(50..=500i32),
                supplier_ids.choose(&mut rng).copied(),
                rng.gen_range(365..730i64),
            )
        };

        // Created empty; stock arrives below as a backdated restock so the
        // movement lands in a historical segment.
        let product = services
            .products
            .create_product(CreateProduct {
                sku: format!("SKU-{:08}", i + 1),
                name,
                description: Some("Seeded demo product".into()),
                price: Decimal::new(price_cents, 2),
                quantity_in_stock: 0,
                supplier_id,
            })
            .await?;

        services
            .ledger
            .record_movement(NewMovement {
                product_id: product.id,
                quantity_changed: initial_stock,
                movement_type: MovementType::Restock,
                timestamp: Some(Utc::now() - Duration::days(backdate_days)),
            })
            .await?;

        product_ids.push(product.id);
    }
    info!("Created {} products and their initial restock movements", product_ids.len());

    info!("Seeding {} orders...", args.orders);
    let mut placed = 0usize;
    for _ in 0..args.orders {
        let (customer, items, status) = {
            let mut rng = rand::thread_rng();
            let customer = format!(
                "{} {}",
                FIRST_NAMES.choose(&mut rng).unwrap_or(&"Alex"),
                LAST_NAMES.choose(&mut rng).unwrap_or(&"Lee"),
            );
            let count = rng.gen_range(1..=5usize);
            let items: Vec<NewOrderItem> = (0..count)
                .filter_map(|_| {
                    product_ids.choose(&mut rng).map(|&product_id| NewOrderItem {
                        product_id,
                        quantity: rng.gen_range(1..=5),
                    })
                })
                .collect();
            let status = [
                OrderStatus::Pending,
                OrderStatus::Completed,
                OrderStatus::Cancelled,
            ]
            .choose(&mut rng)
            .cloned()
            .unwrap_or(OrderStatus::Pending);
            (customer, items, status)
        };

        let order = match services
            .orders
            .create_order(CreateOrder {
                customer_name: customer,
                items,
            })
            .await
        {
            Ok(order) => order,
            Err(ServiceError::InsufficientStock(msg)) => {
                warn!("Skipping order: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if status != OrderStatus::Pending {
            services
                .orders
                .update_order_status(order.order.id, status)
                .await?;
        }
        placed += 1;
    }
    info!("Created {} orders", placed);

    info!("Seed data complete");
    Ok(())
}

/// Deletes all data, children before parents so no FK trips.
async fn clean_data(db: &sea_orm::DatabaseConnection) -> anyhow::Result<()> {
    use smart_inventory_api::entities::{inventory_movement, order, order_item, product, supplier};

    warn!("Cleaning all data from the database...");
    inventory_movement::Entity::delete_many().exec(db).await?;
    order_item::Entity::delete_many().exec(db).await?;
    order::Entity::delete_many().exec(db).await?;
    product::Entity::delete_many().exec(db).await?;
    supplier::Entity::delete_many().exec(db).await?;
    info!("All data has been deleted");
    Ok(())
}
