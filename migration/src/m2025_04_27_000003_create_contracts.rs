//! Creates the versioned contracts table.

use sea_orm_migration::prelude::*;

use crate::m2025_04_27_000001_create_companies::Companies;
use crate::{identity_columns, lifecycle_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table.table(Contracts::Table).if_not_exists();
        identity_columns(&mut table, Contracts::Id, Contracts::ExternalId);
        table.col(ColumnDef::new(Contracts::Provider).text().not_null());
        for rate in [
            Contracts::RentValue,
            Contracts::DebitTax,
            Contracts::PixTax,
            Contracts::CreditTax,
            Contracts::CreditLowTax,
            Contracts::CreditHighTax,
        ] {
            table.col(ColumnDef::new(rate).decimal_len(12, 4).not_null());
        }
        table
            .col(ColumnDef::new(Contracts::PaymentInterval).text().not_null())
            .col(ColumnDef::new(Contracts::Version).integer().not_null())
            .col(ColumnDef::new(Contracts::IsCurrent).boolean().not_null())
            .col(ColumnDef::new(Contracts::MainContact).text().null())
            .col(ColumnDef::new(Contracts::CompanyId).integer().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_contracts_company_id")
                    .from(Contracts::Table, Contracts::CompanyId)
                    .to(Companies::Table, Companies::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        lifecycle_columns(
            &mut table,
            Contracts::CreatedAt,
            Contracts::UpdatedAt,
            Contracts::DeletedAt,
        );

        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contracts_company_provider")
                    .table(Contracts::Table)
                    .col(Contracts::CompanyId)
                    .col(Contracts::Provider)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contracts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
pub(crate) enum Contracts {
    Table,
    Id,
    ExternalId,
    Provider,
    RentValue,
    DebitTax,
    PixTax,
    CreditTax,
    CreditLowTax,
    CreditHighTax,
    PaymentInterval,
    Version,
    IsCurrent,
    MainContact,
    CompanyId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
