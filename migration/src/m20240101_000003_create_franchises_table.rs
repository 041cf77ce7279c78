use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Franchises::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Franchises::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Franchises::FranchiseCode)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Franchises::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Franchises::DealType).string_len(1).not_null())
                    .col(ColumnDef::new(Franchises::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Franchises::Address).text().not_null())
                    .col(
                        ColumnDef::new(Franchises::CommissionStructure)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Franchises::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Franchises::ActivatedAt).timestamp())
                    .col(
                        ColumnDef::new(Franchises::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Franchises::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_franchises_owner_id")
                            .from(Franchises::Table, Franchises::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_franchises_status")
                    .table(Franchises::Table)
                    .col(Franchises::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_franchises_owner_id")
                    .table(Franchises::Table)
                    .col(Franchises::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Franchises::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Franchises {
    Table,
    Id,
    FranchiseCode,
    Name,
    DealType,
    OwnerId,
    Address,
    CommissionStructure,
    Status,
    ActivatedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
