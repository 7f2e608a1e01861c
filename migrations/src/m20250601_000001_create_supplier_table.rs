use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Supplier::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Supplier::Id)
                            .integer()
                            .auto_increment()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Supplier::Name).string().not_null())
                    .col(ColumnDef::new(Supplier::ContactPerson).string().null())
                    .col(
                        ColumnDef::new(Supplier::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Supplier::Phone).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_supplier_name")
                    .table(Supplier::Table)
                    .col(Supplier::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Supplier::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Supplier {
    Table,
    Id,
    Name,
    ContactPerson,
    Email,
    Phone,
}
