//! # Pdv Repository
//!
//! Point-of-sale devices are provisioned by administrators only, and a serial number
//! can never be reused, not even after the device was removed.

use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use tracing::info;

use super::{ScopedRepository, active_value};
use crate::error::RepositoryError;
use crate::models::pdv::{ActiveModel, Column, Entity as Pdv, Model};
use crate::session::SessionContext;

pub struct PdvRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PdvRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_new_pdv(
        &self,
        session: &SessionContext,
        candidate: ActiveModel,
    ) -> Result<Model, RepositoryError> {
        session.require_admin()?;

        let serial_number = active_value(&candidate.serial_number)
            .ok_or_else(|| RepositoryError::invalid_input("serial number is required"))?;

        if self.find_by_serial_number(session, &serial_number).await?.is_some() {
            return Err(RepositoryError::conflict("SERIAL_NUMBER_ALREADY_EXISTS"));
        }

        let created = ScopedRepository::<Pdv>::new(self.db)
            .create(session, candidate)
            .await?;

        info!(pdv_id = %created.external_id, serial_number = %created.serial_number, "pdv created");
        Ok(created)
    }

    /// Any pdv, removed ones included, carrying `serial_number`.
    pub async fn find_by_serial_number(
        &self,
        session: &SessionContext,
        serial_number: &str,
    ) -> Result<Option<Model>, RepositoryError> {
        ScopedRepository::<Pdv>::new(self.db)
            .with_deleted()
            .find_one_optional(
                session,
                Condition::all().add(Column::SerialNumber.eq(serial_number)),
            )
            .await
    }
}
