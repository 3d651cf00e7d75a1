//! Company entity model
//!
//! A company is the tenant root: users, contracts, pdvs and orders all belong
//! to exactly one company.

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::repositories::{EntityConfig, ScopedEntity};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub external_id: Uuid,

    /// Legal name
    pub name: String,

    /// Trade name
    pub social_name: String,

    /// 14-digit tax registration number
    #[sea_orm(unique)]
    pub revenue_record: String,

    pub phone: Option<String>,

    pub payment_method: String,

    #[sea_orm(unique)]
    pub email: String,

    pub is_active: bool,

    pub main_contact: String,

    pub address: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ScopedEntity for Entity {
    const CONFIG: EntityConfig<Column> = EntityConfig {
        name: "COMPANY",
        id: Column::Id,
        external_id: Column::ExternalId,
        created_at: Column::CreatedAt,
        updated_at: Column::UpdatedAt,
        tenant: None,
        deleted_at: Some(Column::DeletedAt),
    };
}
