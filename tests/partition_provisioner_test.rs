//! Provisioner behavior against a real Postgres.
//!
//! Run with: cargo test -- --ignored --test-threads=1

mod common;

use assert_matches::assert_matches;
use sea_orm::ConnectionTrait;
use smart_inventory_api::errors::ServiceError;
use smart_inventory_api::services::partitions::{partition_name, ProvisionOutcome};

#[tokio::test]
#[ignore]
async fn ensure_partition_is_idempotent() {
    let (db, services) = common::setup().await;
    common::drop_partition(&db, &partition_name(2030)).await;

    let first = services
        .partitions
        .ensure_partition(2030)
        .await
        .expect("first call");
    assert_eq!(first, ProvisionOutcome::Created);

    let second = services
        .partitions
        .ensure_partition(2030)
        .await
        .expect("second call");
    assert_eq!(second, ProvisionOutcome::AlreadyExists);

    let partitions = services.partitions.list_partitions().await.expect("list");
    let matching = partitions
        .iter()
        .filter(|p| p.name == partition_name(2030))
        .count();
    assert_eq!(matching, 1, "exactly one segment for 2030");
}

#[tokio::test]
#[ignore]
async fn years_outside_the_window_fail_validation() {
    let (_db, services) = common::setup().await;

    assert_matches!(
        services.partitions.ensure_partition(2019).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        services.partitions.ensure_partition(2051).await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
#[ignore]
async fn window_edges_are_provisionable() {
    let (db, services) = common::setup().await;
    common::drop_partition(&db, &partition_name(2020)).await;
    common::drop_partition(&db, &partition_name(2050)).await;

    assert_eq!(
        services
            .partitions
            .ensure_partition(2020)
            .await
            .expect("2020"),
        ProvisionOutcome::Created
    );
    assert_eq!(
        services
            .partitions
            .ensure_partition(2050)
            .await
            .expect("2050"),
        ProvisionOutcome::Created
    );
}

#[tokio::test]
#[ignore]
async fn mismatched_bounds_conflict_without_mutating() {
    let (db, services) = common::setup().await;
    common::drop_partition(&db, &partition_name(2033)).await;

    // Half-year segment under the name the provisioner would use.
    db.execute_unprepared(
        "CREATE TABLE inventory_movement_y2033 PARTITION OF inventory_movement \
         FOR VALUES FROM ('2033-01-01 00:00:00+00') TO ('2033-07-01 00:00:00+00');",
    )
    .await
    .expect("manual partition");

    let err = services
        .partitions
        .ensure_partition(2033)
        .await
        .expect_err("conflicting bounds must not succeed");
    assert_matches!(err, ServiceError::PartitionConflict(_));

    // The existing segment is untouched.
    let partitions = services.partitions.list_partitions().await.expect("list");
    let segment = partitions
        .iter()
        .find(|p| p.name == partition_name(2033))
        .expect("segment still attached");
    assert!(segment.bounds.contains("2033-07-01"));

    common::drop_partition(&db, &partition_name(2033)).await;
}

#[tokio::test]
#[ignore]
async fn overlapping_foreign_segment_conflicts() {
    let (db, services) = common::setup().await;
    common::drop_partition(&db, "inventory_movement_h1_2034").await;
    common::drop_partition(&db, &partition_name(2034)).await;

    // Differently-named segment covering the first half of 2034.
    db.execute_unprepared(
        "CREATE TABLE inventory_movement_h1_2034 PARTITION OF inventory_movement \
         FOR VALUES FROM ('2034-01-01 00:00:00+00') TO ('2034-07-01 00:00:00+00');",
    )
    .await
    .expect("manual partition");

    let err = services
        .partitions
        .ensure_partition(2034)
        .await
        .expect_err("overlap must not succeed");
    assert_matches!(err, ServiceError::PartitionConflict(_));

    common::drop_partition(&db, "inventory_movement_h1_2034").await;
}

#[tokio::test]
#[ignore]
async fn concurrent_ensure_partition_converges() {
    let (db, services) = common::setup().await;
    common::drop_partition(&db, &partition_name(2040)).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let svc = services.partitions.clone();
        tasks.push(tokio::spawn(async move { svc.ensure_partition(2040).await }));
    }

    let mut created = 0;
    for task in tasks {
        match task.await.expect("join") {
            Ok(ProvisionOutcome::Created) => created += 1,
            Ok(ProvisionOutcome::AlreadyExists) => {}
            Err(e) => panic!("no caller may observe a conflict against itself: {}", e),
        }
    }
    assert!(created >= 1, "someone must have created the segment");

    let partitions = services.partitions.list_partitions().await.expect("list");
    let matching = partitions
        .iter()
        .filter(|p| p.name == partition_name(2040))
        .count();
    assert_eq!(matching, 1, "exactly one segment for 2040");
}
