use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

const VIEW_NAME: &str = "vw_stock_valuation";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!(
                r#"
                CREATE VIEW {VIEW_NAME} AS
                 SELECT p.id,
                    p.name,
                    p.sku,
                    p.price,
                    p.quantity_in_stock,
                    p.price * p.quantity_in_stock AS valuation
                   FROM product p;
                "#
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!("DROP VIEW {VIEW_NAME};"))
            .await?;

        Ok(())
    }
}
