//! User management and onboarding.
//!
//! New users are created inactive with an 8-digit verification code that is
//! delivered through the [`Notifier`]. Validating the code activates the account.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::resolve;
use crate::config::AppConfig;
use crate::error::RepositoryError;
use crate::models::company::Entity as Company;
use crate::models::user::{self, Column, Entity as User, UserRole};
use crate::notifier::Notifier;
use crate::repositories::{
    FilterBuilder, PageRequest, Paginated, ScopedRepository, UserRepository, now,
};
use crate::session::SessionContext;

/// 8 to 30 characters without whitespace, mixing upper case, lower case, digits and symbols.
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let length_ok = (8..=30).contains(&password.chars().count());
    let strong = password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        && !password.chars().any(char::is_whitespace);

    if length_ok && strong {
        return Ok(());
    }
    let mut err = ValidationError::new("password");
    err.message = Some("INVALID_PASSWORD".into());
    Err(err)
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "REQUIRED_NAME"))]
    pub name: String,
    #[validate(length(min = 1, message = "REQUIRED_SURNAME"))]
    pub surname: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "REQUIRED_IDENTIFIER"))]
    pub identifier: String,
    pub role: UserRole,
    #[validate(email(message = "INVALID_EMAIL"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    /// Required for managers and viewers created by an admin
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct ValidateCodeRequest {
    #[validate(length(equal = 8, message = "INVALID_CODE"))]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UserFilter {
    pub identifier: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub identifier: String,
    pub role: UserRole,
    pub email: String,
    pub is_active: bool,
    pub company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    fn new(model: user::Model, company_id: Option<Uuid>) -> Self {
        Self {
            id: model.external_id,
            name: model.name,
            surname: model.surname,
            full_name: model.full_name,
            phone: model.phone,
            identifier: model.identifier,
            role: model.role,
            email: model.email,
            is_active: model.is_active,
            company_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

pub(crate) async fn hash_password(password: String, cost: u32) -> Result<String, RepositoryError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| RepositoryError::internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| RepositoryError::internal(format!("password hashing failed: {e}")))
}

/// Random code in `10000000..=99999999`.
pub fn verification_code() -> String {
    rand::thread_rng()
        .gen_range(10_000_000..100_000_000u32)
        .to_string()
}

pub struct UserService<'a> {
    db: &'a DatabaseConnection,
    config: &'a AppConfig,
    notifier: &'a dyn Notifier,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a DatabaseConnection, config: &'a AppConfig, notifier: &'a dyn Notifier) -> Self {
        Self {
            db,
            config,
            notifier,
        }
    }

    fn repo(&self) -> ScopedRepository<'a, User> {
        ScopedRepository::new(self.db)
    }

    pub async fn respond(&self, model: user::Model) -> Result<UserResponse, RepositoryError> {
        let company_id = match model.company_id {
            Some(id) => ScopedRepository::<Company>::new(self.db)
                .external_ids(vec![id])
                .await?
                .get(&id)
                .copied(),
            None => None,
        };
        Ok(UserResponse::new(model, company_id))
    }

    /// Creates an inactive user and sends the verification code.
    ///
    /// Admins may create any role; managers may create managers and viewers of their
    /// own company.
    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreateUserRequest,
    ) -> Result<user::Model, RepositoryError> {
        let actor = session.require_any_role(&[UserRole::Admin, UserRole::Manager])?;
        if actor.role == UserRole::Manager && request.role == UserRole::Admin {
            return Err(RepositoryError::unauthorized());
        }

        let company_id = match (session.tenant_id(), request.company_id) {
            (Some(tenant_id), _) => Some(tenant_id),
            (None, Some(id)) => {
                Some(resolve::<Company>(self.db, session, id, "COMPANY_NOT_FOUND").await?.id)
            }
            (None, None) if request.role == UserRole::Admin => None,
            (None, None) => return Err(RepositoryError::invalid_input("COMPANY_REQUIRED")),
        };

        let email = request.email.trim().to_lowercase();
        let code = verification_code();
        let password = hash_password(request.password, self.config.password_hash_cost).await?;
        let full_name = format!("{} {}", request.name.trim(), request.surname.trim());

        let candidate = user::ActiveModel {
            name: Set(request.name.trim().to_string()),
            surname: Set(request.surname.trim().to_string()),
            full_name: Set(full_name),
            phone: Set(request.phone),
            identifier: Set(request.identifier.trim().to_string()),
            role: Set(request.role),
            email: Set(email),
            password: Set(password),
            is_active: Set(false),
            verification_code: Set(Some(code.clone())),
            code_created_at: Set(Some(now())),
            company_id: Set(company_id),
            ..Default::default()
        };

        let created = UserRepository::new(self.db)
            .create_new_user(session, candidate)
            .await?;

        if let Err(error) = self
            .notifier
            .send_verification_code(&created.email, &code)
            .await
        {
            tracing::error!(user_id = %created.external_id, %error, "verification code not delivered");
        }

        tracing::info!(user_id = %created.external_id, role = ?created.role, "user created");
        Ok(created)
    }

    /// Activates the user when `code` matches the issued one and is still fresh.
    pub async fn validate(&self, id: Uuid, code: &str) -> Result<user::Model, RepositoryError> {
        let anonymous = SessionContext::anonymous();
        let user = self
            .repo()
            .find_by_external_id(&anonymous, id)
            .await?;

        let matches = user
            .verification_code
            .as_deref()
            .is_some_and(|issued| bool::from(issued.as_bytes().ct_eq(code.as_bytes())));
        if !matches {
            return Err(RepositoryError::invalid_input("INVALID_CODE"));
        }

        let ttl = Duration::hours(self.config.verification_code_ttl_hours as i64);
        let expired = user
            .code_created_at
            .is_none_or(|issued_at| issued_at.with_timezone(&Utc) + ttl < Utc::now());
        if expired {
            return Err(RepositoryError::invalid_input("CODE_EXPIRED"));
        }

        let patch = user::ActiveModel {
            is_active: Set(true),
            verification_code: Set(None),
            code_created_at: Set(None),
            ..Default::default()
        };
        let validated = self.repo().update(&anonymous, user.id, patch).await?;

        tracing::info!(user_id = %validated.external_id, "user validated");
        Ok(validated)
    }

    pub async fn myself(&self, session: &SessionContext) -> Result<user::Model, RepositoryError> {
        let current = session.require_user()?;
        self.repo().find_by_primary_key(current.id).await
    }

    pub async fn list(
        &self,
        session: &SessionContext,
        filter: UserFilter,
    ) -> Result<Paginated<UserResponse>, RepositoryError> {
        session.require_user()?;

        let company_id = match filter.company_id {
            Some(id) => Some(resolve::<Company>(self.db, session, id, "COMPANY_NOT_FOUND").await?.id),
            None => None,
        };

        let condition = FilterBuilder::new()
            .contains(Column::Identifier, filter.identifier.as_deref())
            .contains(Column::FullName, filter.full_name.as_deref())
            .contains(Column::Email, filter.email.as_deref())
            .contains(Column::Phone, filter.phone.as_deref())
            .eq(Column::Role, filter.role)
            .eq(Column::CompanyId, company_id)
            .build();

        let page = self
            .repo()
            .find_paginated(session, condition, filter.pagination)
            .await?;
        let companies = ScopedRepository::<Company>::new(self.db)
            .external_ids(page.data.iter().filter_map(|m| m.company_id).collect())
            .await?;
        Ok(page.map(|m| {
            let company_id = m.company_id.and_then(|id| companies.get(&id).copied());
            UserResponse::new(m, company_id)
        }))
    }

    pub async fn find_one(
        &self,
        session: &SessionContext,
        id: Uuid,
    ) -> Result<user::Model, RepositoryError> {
        session.require_user()?;
        self.repo().find_by_external_id(session, id).await
    }

    /// Partial update. Users may edit themselves; admins and managers may edit others.
    /// Only admins grant the admin role. A new password is re-hashed.
    pub async fn update(
        &self,
        session: &SessionContext,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<user::Model, RepositoryError> {
        let actor = session.require_user()?;
        let user = self.find_one(session, id).await?;

        let is_self = actor.id == user.id;
        let is_staff = matches!(actor.role, UserRole::Admin | UserRole::Manager);
        if !is_self && !is_staff {
            return Err(RepositoryError::unauthorized());
        }
        if let Some(role) = request.role.filter(|role| *role != user.role) {
            let allowed = match actor.role {
                UserRole::Admin => true,
                UserRole::Manager => {
                    !is_self && role != UserRole::Admin && user.role != UserRole::Admin
                }
                UserRole::Viewer => false,
            };
            if !allowed {
                return Err(RepositoryError::unauthorized());
            }
        }

        let mut patch = user::ActiveModel::default();
        if request.name.is_some() || request.surname.is_some() {
            let name = request.name.unwrap_or(user.name);
            let surname = request.surname.unwrap_or(user.surname);
            patch.full_name = Set(format!("{} {}", name.trim(), surname.trim()));
            patch.name = Set(name.trim().to_string());
            patch.surname = Set(surname.trim().to_string());
        }
        if let Some(phone) = request.phone {
            patch.phone = Set(Some(phone));
        }
        if let Some(role) = request.role {
            patch.role = Set(role);
        }
        if let Some(password) = request.password {
            patch.password = Set(hash_password(password, self.config.password_hash_cost).await?);
        }
        if let Some(is_active) = request.is_active {
            if !is_staff {
                return Err(RepositoryError::unauthorized());
            }
            patch.is_active = Set(is_active);
        }

        self.repo().update(session, user.id, patch).await
    }

    pub async fn remove(&self, session: &SessionContext, id: Uuid) -> Result<(), RepositoryError> {
        session.require_any_role(&[UserRole::Admin, UserRole::Manager])?;
        let user = self.find_one(session, id).await?;
        self.repo().remove(user.id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_code_has_eight_digits() {
        for _ in 0..100 {
            let code = verification_code();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn password_policy() {
        assert!(validate_password_strength("Str0ng!pass").is_ok());
        assert!(validate_password_strength("weak").is_err());
        assert!(validate_password_strength("alllowercase1!").is_err());
        assert!(validate_password_strength("NoDigits!here").is_err());
        assert!(validate_password_strength("With Space1!").is_err());
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hash = hash_password("Str0ng!pass".to_string(), 4).await.unwrap();
        assert_ne!(hash, "Str0ng!pass");
        assert!(bcrypt::verify("Str0ng!pass", &hash).unwrap());
    }
}
