//! Creates the payment orders table.

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
        table.table(Orders::Table).if_not_exists();
        identity_columns(&mut table, Orders::Id, Orders::ExternalId);
        table
            .col(ColumnDef::new(Orders::Provider).text().not_null())
            .col(ColumnDef::new(Orders::PaymentMethod).text().not_null())
            .col(ColumnDef::new(Orders::Installment).integer().null())
            .col(ColumnDef::new(Orders::Amount).double().not_null())
            .col(ColumnDef::new(Orders::CreditFlag).text().null())
            .col(ColumnDef::new(Orders::ContractId).integer().not_null())
            .col(ColumnDef::new(Orders::CompanyId).integer().not_null())
            .col(
                ColumnDef::new(Orders::CompletedAt)
                    .timestamp_with_time_zone()
                    .null(),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_orders_contract_id")
                    .from(Orders::Table, Orders::ContractId)
                    .to(Contracts::Table, Contracts::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_orders_company_id")
                    .from(Orders::Table, Orders::CompanyId)
                    .to(Companies::Table, Companies::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        lifecycle_columns(
            &mut table,
            Orders::CreatedAt,
            Orders::UpdatedAt,
            Orders::DeletedAt,
        );

        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_contract_id")
                    .table(Orders::Table)
                    .col(Orders::ContractId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_company_completed_at")
                    .table(Orders::Table)
                    .col(Orders::CompanyId)
                    .col(Orders::CompletedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Orders {
    Table,
    Id,
    ExternalId,
    Provider,
    PaymentMethod,
    Installment,
    Amount,
    CreditFlag,
    ContractId,
    CompanyId,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
