//! Creates the knowledge-base resources table.

use sea_orm_migration::prelude::*;

use crate::m2025_07_21_000001_create_topics::Topics;
use crate::{identity_columns, lifecycle_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table.table(Resources::Table).if_not_exists();
        identity_columns(&mut table, Resources::Id, Resources::ExternalId);
        table
            .col(ColumnDef::new(Resources::TopicId).integer().null())
            .col(ColumnDef::new(Resources::Type).text().not_null())
            .col(ColumnDef::new(Resources::Url).text().not_null())
            .col(ColumnDef::new(Resources::Description).text().null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_resources_topic_id")
                    .from(Resources::Table, Resources::TopicId)
                    .to(Topics::Table, Topics::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            );
        lifecycle_columns(
            &mut table,
            Resources::CreatedAt,
            Resources::UpdatedAt,
            Resources::DeletedAt,
        );

        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_resources_url")
                    .table(Resources::Table)
                    .col(Resources::Url)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Resources::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Resources {
    Table,
    Id,
    ExternalId,
    TopicId,
    Type,
    Url,
    Description,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
