//! Creates the users table. Admins may have no company.

use sea_orm_migration::prelude::*;

use crate::m2025_04_27_000001_create_companies::Companies;
use crate::{identity_columns, lifecycle_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table.table(Users::Table).if_not_exists();
        identity_columns(&mut table, Users::Id, Users::ExternalId);
        table
            .col(ColumnDef::new(Users::Name).text().not_null())
            .col(ColumnDef::new(Users::Surname).text().not_null())
            .col(ColumnDef::new(Users::FullName).text().not_null())
            .col(ColumnDef::new(Users::Phone).text().null())
            .col(ColumnDef::new(Users::Identifier).text().not_null().unique_key())
            .col(ColumnDef::new(Users::Role).text().not_null())
            .col(ColumnDef::new(Users::Email).text().not_null().unique_key())
            .col(ColumnDef::new(Users::Password).text().not_null())
            .col(
                ColumnDef::new(Users::IsActive)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(ColumnDef::new(Users::VerificationCode).string_len(8).null())
            .col(
                ColumnDef::new(Users::CodeCreatedAt)
                    .timestamp_with_time_zone()
                    .null(),
            )
            .col(ColumnDef::new(Users::CompanyId).integer().null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_users_company_id")
                    .from(Users::Table, Users::CompanyId)
                    .to(Companies::Table, Companies::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            );
        lifecycle_columns(&mut table, Users::CreatedAt, Users::UpdatedAt, Users::DeletedAt);

        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_company_id")
                    .table(Users::Table)
                    .col(Users::CompanyId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Users {
    Table,
    Id,
    ExternalId,
    Name,
    Surname,
    FullName,
    Phone,
    Identifier,
    Role,
    Email,
    Password,
    IsActive,
    VerificationCode,
    CodeCreatedAt,
    CompanyId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
