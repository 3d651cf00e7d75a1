//! Contract entity model
//!
//! Contracts are versioned per (company, provider). Superseded versions are kept
//! with `is_current = false` so past orders keep their fee schedule.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::provider::Provider;
use crate::repositories::{EntityConfig, ScopedEntity, TenantScoped};

/// How often the rent is charged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentInterval {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "biweekly")]
    Biweekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub external_id: Uuid,

    pub provider: Provider,

    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub rent_value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub debit_tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub pix_tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub credit_tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub credit_low_tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub credit_high_tax: Decimal,

    pub payment_interval: PaymentInterval,

    /// Starts at 1 and increases per (company, provider)
    pub version: i32,

    /// At most one current contract per (company, provider)
    pub is_current: bool,

    pub main_contact: Option<String>,

    pub company_id: i32,

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
        name: "CONTRACT",
        id: Column::Id,
        external_id: Column::ExternalId,
        created_at: Column::CreatedAt,
        updated_at: Column::UpdatedAt,
        tenant: Some(<Self as TenantScoped>::TENANT_COLUMN),
        deleted_at: Some(Column::DeletedAt),
    };
}
