//! Payment order entity model

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::provider::Provider;
use crate::repositories::{EntityConfig, ScopedEntity, TenantScoped};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "pix")]
    Pix,
    #[sea_orm(string_value = "credit")]
    Credit,
    #[sea_orm(string_value = "debit")]
    Debit,
}

/// Card brand of a credit payment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum CreditFlag {
    #[sea_orm(string_value = "visa")]
    Visa,
    #[sea_orm(string_value = "mastercard")]
    Mastercard,
    #[sea_orm(string_value = "elo")]
    Elo,
    #[sea_orm(string_value = "amex")]
    Amex,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub external_id: Uuid,

    /// Copied from the contract at creation
    pub provider: Provider,

    pub payment_method: PaymentMethod,

    pub installment: Option<i32>,

    #[sea_orm(column_type = "Double")]
    pub amount: f64,

    pub credit_flag: Option<CreditFlag>,

    pub contract_id: i32,

    pub company_id: i32,

    pub completed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contract::Entity",
        from = "Column::ContractId",
        to = "super::contract::Column::Id"
    )]
    Contract,
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
}

impl Related<super::contract::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contract.def()
    }
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
        name: "ORDER",
        id: Column::Id,
        external_id: Column::ExternalId,
        created_at: Column::CreatedAt,
        updated_at: Column::UpdatedAt,
        tenant: Some(<Self as TenantScoped>::TENANT_COLUMN),
        deleted_at: Some(Column::DeletedAt),
    };
}
