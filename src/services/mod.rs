//! # Application Services
//!
//! One service per entity. Services translate request DTOs into repository calls:
//! they resolve external ids of related rows, enforce role rules, run uniqueness
//! prechecks and re-signal `NotFound` with domain codes. The [`SessionContext`] is
//! always passed in by the caller.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, IntoActiveModel,
};
use uuid::Uuid;
use validator::ValidationError;

use crate::error::RepositoryError;
use crate::repositories::{ScopedEntity, ScopedRepository};
use crate::session::SessionContext;

pub mod auth;
pub mod company;
pub mod contract;
pub mod order;
pub mod pdv;
pub mod resource;
pub mod topic;
pub mod user;

pub use auth::AuthService;
pub use company::CompanyService;
pub use contract::ContractService;
pub use order::OrderService;
pub use pdv::PdvService;
pub use resource::ResourceService;
pub use topic::TopicService;
pub use user::UserService;

/// Loads a row by external id within the session's scope; a miss becomes `NotFound(code)`.
pub(crate) async fn resolve<E>(
    db: &DatabaseConnection,
    session: &SessionContext,
    external_id: Uuid,
    code: &str,
) -> Result<E::Model, RepositoryError>
where
    E: ScopedEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
{
    ScopedRepository::<E>::new(db)
        .find_by_external_id(session, external_id)
        .await
        .map_err(|e| e.not_found_as(code))
}

pub(crate) fn validate_not_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}
