//! Database migrations for the back-office API.
//!
//! One migration per table, applied in dependency order.

pub use sea_orm_migration::prelude::*;

mod m2025_04_27_000001_create_companies;
mod m2025_04_27_000002_create_users;
mod m2025_04_27_000003_create_contracts;
mod m2025_04_27_000004_create_pdvs;
mod m2025_06_07_000001_create_orders;
mod m2025_07_21_000001_create_topics;
mod m2025_07_21_000002_create_resources;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_04_27_000001_create_companies::Migration),
            Box::new(m2025_04_27_000002_create_users::Migration),
            Box::new(m2025_04_27_000003_create_contracts::Migration),
            Box::new(m2025_04_27_000004_create_pdvs::Migration),
            Box::new(m2025_06_07_000001_create_orders::Migration),
            Box::new(m2025_07_21_000001_create_topics::Migration),
            Box::new(m2025_07_21_000002_create_resources::Migration),
        ]
    }
}

/// Columns shared by every table: surrogate key, public id and lifecycle timestamps.
pub(crate) fn identity_columns<T: IntoIden + Copy>(
    table: &mut TableCreateStatement,
    id: T,
    external_id: T,
) -> &mut TableCreateStatement {
    table
        .col(
            ColumnDef::new(id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(external_id).uuid().not_null().unique_key())
}

pub(crate) fn lifecycle_columns<T: IntoIden + Copy>(
    table: &mut TableCreateStatement,
    created_at: T,
    updated_at: T,
    deleted_at: T,
) -> &mut TableCreateStatement {
    table
        .col(
            ColumnDef::new(created_at)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(updated_at)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(ColumnDef::new(deleted_at).timestamp_with_time_zone().null())
}
