//! # User Repository

use sea_orm::{ColumnTrait, Condition, DatabaseConnection};

use super::{ScopedRepository, active_value};
use crate::error::RepositoryError;
use crate::models::user::{ActiveModel, Column, Entity as User, Model};
use crate::session::SessionContext;

pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user after checking that neither the e-mail nor the identifier was
    /// ever registered.
    pub async fn create_new_user(
        &self,
        session: &SessionContext,
        candidate: ActiveModel,
    ) -> Result<Model, RepositoryError> {
        if let Some(email) = active_value(&candidate.email) {
            self.ensure_unused(Column::Email, email, "EMAIL_ALREADY_EXISTS")
                .await?;
        }
        if let Some(identifier) = active_value(&candidate.identifier) {
            self.ensure_unused(Column::Identifier, identifier, "IDENTIFIER_ALREADY_EXISTS")
                .await?;
        }

        ScopedRepository::<User>::new(self.db)
            .create(session, candidate)
            .await
    }

    /// Live user with this e-mail, across all tenants.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Model>, RepositoryError> {
        ScopedRepository::<User>::new(self.db)
            .find_one_optional(
                &SessionContext::anonymous(),
                Condition::all().add(Column::Email.eq(email.trim().to_lowercase())),
            )
            .await
    }

    /// Fails with `code` when any user, removed ones included, already has `value`.
    pub async fn ensure_unused(
        &self,
        column: Column,
        value: String,
        code: &str,
    ) -> Result<(), RepositoryError> {
        let taken = ScopedRepository::<User>::new(self.db)
            .with_deleted()
            .count(
                &SessionContext::anonymous(),
                Condition::all().add(column.eq(value)),
            )
            .await?;

        if taken > 0 {
            return Err(RepositoryError::conflict(code));
        }
        Ok(())
    }
}
