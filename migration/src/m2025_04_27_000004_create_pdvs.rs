//! Creates the point-of-sale devices table.

use sea_orm_migration::prelude::*;

use crate::m2025_04_27_000001_create_companies::Companies;
use crate::m2025_04_27_000003_create_contracts::Contracts;
use crate::{identity_columns, lifecycle_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table.table(Pdvs::Table).if_not_exists();
        identity_columns(&mut table, Pdvs::Id, Pdvs::ExternalId);
        table
            .col(ColumnDef::new(Pdvs::Provider).text().not_null())
            .col(
                ColumnDef::new(Pdvs::Status)
                    .text()
                    .not_null()
                    .default("active"),
            )
            .col(
                ColumnDef::new(Pdvs::SerialNumber)
                    .text()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Pdvs::ContractId).integer().not_null())
            .col(ColumnDef::new(Pdvs::CompanyId).integer().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_pdvs_contract_id")
                    .from(Pdvs::Table, Pdvs::ContractId)
                    .to(Contracts::Table, Contracts::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_pdvs_company_id")
                    .from(Pdvs::Table, Pdvs::CompanyId)
                    .to(Companies::Table, Companies::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        lifecycle_columns(&mut table, Pdvs::CreatedAt, Pdvs::UpdatedAt, Pdvs::DeletedAt);

        manager.create_table(table.to_owned()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pdvs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Pdvs {
    Table,
    Id,
    ExternalId,
    Provider,
    Status,
    SerialNumber,
    ContractId,
    CompanyId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
