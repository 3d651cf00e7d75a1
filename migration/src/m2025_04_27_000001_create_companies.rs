//! Creates the companies table, the tenant root.

use sea_orm_migration::prelude::*;

use crate::{identity_columns, lifecycle_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table.table(Companies::Table).if_not_exists();
        identity_columns(&mut table, Companies::Id, Companies::ExternalId);
        table
            .col(ColumnDef::new(Companies::Name).text().not_null())
            .col(ColumnDef::new(Companies::SocialName).text().not_null())
            .col(
                ColumnDef::new(Companies::RevenueRecord)
                    .string_len(14)
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Companies::Phone).text().null())
            .col(ColumnDef::new(Companies::PaymentMethod).text().not_null())
            .col(ColumnDef::new(Companies::Email).text().not_null().unique_key())
            .col(
                ColumnDef::new(Companies::IsActive)
                    .boolean()
                    .not_null()
                    .default(true),
            )
            .col(ColumnDef::new(Companies::MainContact).text().not_null())
            .col(ColumnDef::new(Companies::Address).text().not_null());
        lifecycle_columns(
            &mut table,
            Companies::CreatedAt,
            Companies::UpdatedAt,
            Companies::DeletedAt,
        );

        manager.create_table(table.to_owned()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
pub(crate) enum Companies {
    Table,
    Id,
    ExternalId,
    Name,
    SocialName,
    RevenueRecord,
    Phone,
    PaymentMethod,
    Email,
    IsActive,
    MainContact,
    Address,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
