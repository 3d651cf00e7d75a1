//! Knowledge-base resource entity model (video, article or pdf link).

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repositories::{EntityConfig, ScopedEntity};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "article")]
    Article,
    #[sea_orm(string_value = "pdf")]
    Pdf,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub external_id: Uuid,

    pub topic_id: Option<i32>,

    #[sea_orm(column_name = "type")]
    pub kind: ResourceType,

    pub url: String,

    pub description: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::topic::Entity",
        from = "Column::TopicId",
        to = "super::topic::Column::Id"
    )]
    Topic,
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ScopedEntity for Entity {
    const CONFIG: EntityConfig<Column> = EntityConfig {
        name: "RESOURCE",
        id: Column::Id,
        external_id: Column::ExternalId,
        created_at: Column::CreatedAt,
        updated_at: Column::UpdatedAt,
        tenant: None,
        deleted_at: Some(Column::DeletedAt),
    };
}
