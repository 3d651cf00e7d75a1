//! User entity model

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repositories::{EntityConfig, ScopedEntity, TenantScoped};

/// Access level of a user. Admins are never tenant-scoped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    #[serde(alias = "editor")]
    Manager,
    #[sea_orm(string_value = "viewer")]
    Viewer,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub external_id: Uuid,

    pub name: String,
    pub surname: String,
    pub full_name: String,
    pub phone: Option<String>,

    /// National document number
    #[sea_orm(unique)]
    pub identifier: String,

    pub role: UserRole,

    #[sea_orm(unique)]
    pub email: String,

    /// bcrypt hash, never the clear-text password
    pub password: String,

    pub is_active: bool,

    /// 8-digit onboarding code, cleared once validated
    pub verification_code: Option<String>,
    pub code_created_at: Option<DateTimeWithTimeZone>,

    /// `None` only for admins
    pub company_id: Option<i32>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TenantScoped for Entity {
    const TENANT_COLUMN: Column = Column::CompanyId;
}

impl ScopedEntity for Entity {
    const CONFIG: EntityConfig<Column> = EntityConfig {
        name: "USER",
        id: Column::Id,
        external_id: Column::ExternalId,
        created_at: Column::CreatedAt,
        updated_at: Column::UpdatedAt,
        tenant: Some(<Self as TenantScoped>::TENANT_COLUMN),
        deleted_at: Some(Column::DeletedAt),
    };
}
