use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

// The movement ledger is range-partitioned by timestamp. sea-query has no
// vocabulary for PARTITION BY, so the DDL is raw SQL. The partition key must
// be part of the primary key, hence PRIMARY KEY (id, timestamp); id comes
// from one global sequence shared by all segments.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            CREATE TABLE inventory_movement (
                id BIGINT GENERATED BY DEFAULT AS IDENTITY,
                product_id INTEGER NOT NULL,
                quantity_changed INTEGER NOT NULL,
                movement_type VARCHAR(16) NOT NULL,
                "timestamp" TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (id, "timestamp")
            ) PARTITION BY RANGE ("timestamp");
            "#,
        )
        .await?;

        // Outgoing foreign keys on a partitioned parent cascade to every
        // segment, current and future.
        db.execute_unprepared(
            r#"
            ALTER TABLE inventory_movement
                ADD CONSTRAINT fk_inventory_movement_product_id
                FOREIGN KEY (product_id) REFERENCES product (id);
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE INDEX idx_inventory_movement_product_id
                ON inventory_movement (product_id);
            "#,
        )
        .await?;

        // Seed segments. Further years are provisioned on demand through the
        // maintenance endpoint.
        for year in [2024, 2025, 2026] {
            db.execute_unprepared(&format!(
                "CREATE TABLE inventory_movement_y{year} \
                 PARTITION OF inventory_movement \
                 FOR VALUES FROM ('{year}-01-01 00:00:00+00') TO ('{next}-01-01 00:00:00+00');",
                year = year,
                next = year + 1,
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for year in [2026, 2025, 2024] {
            db.execute_unprepared(&format!(
                "DROP TABLE IF EXISTS inventory_movement_y{year};"
            ))
            .await?;
        }

        db.execute_unprepared("DROP TABLE inventory_movement;").await?;

        Ok(())
    }
}
