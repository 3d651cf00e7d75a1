//! Knowledge-base topic entity model. Topics nest one level deep.

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::repositories::{EntityConfig, ScopedEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "topics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub external_id: Uuid,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Bumped on every edit
    pub version: i32,

    /// `None` for root topics
    pub parent_topic_id: Option<i32>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource::Entity")]
    Resource,
}

impl Related<super::resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ScopedEntity for Entity {
    const CONFIG: EntityConfig<Column> = EntityConfig {
        name: "TOPIC",
        id: Column::Id,
        external_id: Column::ExternalId,
        created_at: Column::CreatedAt,
        updated_at: Column::UpdatedAt,
        tenant: None,
        deleted_at: Some(Column::DeletedAt),
    };
}
