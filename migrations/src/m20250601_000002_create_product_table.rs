use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Product::Id)
                            .integer()
                            .auto_increment()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Product::Sku)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Product::Name).string().not_null())
                    .col(ColumnDef::new(Product::Description).string().null())
                    .col(
                        ColumnDef::new(Product::Price)
                            .decimal_len(10, 2)
                            .not_null()
                            .check(Expr::col(Product::Price).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Product::QuantityInStock)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Product::QuantityInStock).gte(0)),
                    )
                    .col(ColumnDef::new(Product::SupplierId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_supplier_id")
                            .from(Product::Table, Product::SupplierId)
                            .to(Supplier::Table, Supplier::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_name")
                    .table(Product::Table)
                    .col(Product::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Product::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
    Sku,
    Name,
    Description,
    Price,
    QuantityInStock,
    SupplierId,
}

#[derive(DeriveIden)]
enum Supplier {
    Table,
    Id,
}
