//! # Resource Repository

use sea_orm::{ColumnTrait, Condition, DatabaseConnection};

use super::{ScopedRepository, active_value};
use crate::error::RepositoryError;
use crate::models::resource::{ActiveModel, Column, Entity as Resource, Model};
use crate::session::SessionContext;

pub struct ResourceRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ResourceRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Admin-only; a url may be linked by one live resource at a time.
    pub async fn create_new_resource(
        &self,
        session: &SessionContext,
        candidate: ActiveModel,
    ) -> Result<Model, RepositoryError> {
        session.require_admin()?;

        let url = active_value(&candidate.url)
            .ok_or_else(|| RepositoryError::invalid_input("url is required"))?;

        let resources = ScopedRepository::<Resource>::new(self.db);
        let existing = resources
            .find_one_optional(session, Condition::all().add(Column::Url.eq(url)))
            .await?;
        if existing.is_some() {
            return Err(RepositoryError::conflict("RESOURCE_ALREADY_EXISTS"));
        }

        resources.create(session, candidate).await
    }
}
