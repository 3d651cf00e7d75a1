//! Creates the knowledge-base topics table.

use sea_orm_migration::prelude::*;

use crate::{identity_columns, lifecycle_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table.table(Topics::Table).if_not_exists();
        identity_columns(&mut table, Topics::Id, Topics::ExternalId);
        table
            .col(ColumnDef::new(Topics::Name).text().not_null())
            .col(ColumnDef::new(Topics::Content).text().not_null())
            .col(
                ColumnDef::new(Topics::Version)
                    .integer()
                    .not_null()
                    .default(1),
            )
            .col(ColumnDef::new(Topics::ParentTopicId).integer().null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_topics_parent_topic_id")
                    .from(Topics::Table, Topics::ParentTopicId)
                    .to(Topics::Table, Topics::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        lifecycle_columns(
            &mut table,
            Topics::CreatedAt,
            Topics::UpdatedAt,
            Topics::DeletedAt,
        );

        manager.create_table(table.to_owned()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Topics::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
pub(crate) enum Topics {
    Table,
    Id,
    ExternalId,
    Name,
    Content,
    Version,
    ParentTopicId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
