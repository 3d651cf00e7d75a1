//! Login and token authentication.

use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Authenticator;
use crate::error::RepositoryError;
use crate::models::company::{self, Entity as Company};
use crate::models::user::{self, Entity as User};
use crate::repositories::{ScopedRepository, UserRepository};
use crate::session::{SessionCompany, SessionContext, SessionUser};

const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "INVALID_EMAIL"))]
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "REQUIRED_PASSWORD"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

pub struct AuthService<'a> {
    db: &'a DatabaseConnection,
    authenticator: &'a Authenticator,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a DatabaseConnection, authenticator: &'a Authenticator) -> Self {
        Self { db, authenticator }
    }

    /// Exchanges e-mail and password for an access token.
    ///
    /// Unknown e-mail and wrong password fail alike with `INVALID_CREDENTIALS`; a user
    /// who has not validated their code yet gets `USER_NOT_VALIDATED`.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, RepositoryError> {
        let user = UserRepository::new(self.db)
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| RepositoryError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let hash = user.password.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(request.password, &hash))
            .await
            .map_err(|e| RepositoryError::internal(format!("password check task failed: {e}")))?
            .unwrap_or(false);
        if !verified {
            tracing::info!(user_id = %user.external_id, "rejected login");
            return Err(RepositoryError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        if !user.is_active {
            return Err(RepositoryError::Unauthorized("USER_NOT_VALIDATED".to_string()));
        }

        let company = match user.company_id {
            Some(id) => Some(
                ScopedRepository::<Company>::new(self.db)
                    .find_by_primary_key(id)
                    .await?
                    .external_id,
            ),
            None => None,
        };

        let access_token = self
            .authenticator
            .issue(user.external_id, company, user.role)
            .map_err(|e| RepositoryError::internal(e.to_string()))?;

        tracing::info!(user_id = %user.external_id, "user authenticated");
        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.authenticator.ttl_seconds(),
        })
    }

    /// Builds the session for a bearer token.
    ///
    /// The user is looked up by the token subject among live users of every tenant;
    /// a removed, unknown or inactive user, or a removed company, is `Unauthorized`.
    pub async fn authenticate(&self, token: &str) -> Result<SessionContext, RepositoryError> {
        let claims = self.authenticator.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            RepositoryError::Unauthorized("INVALID_TOKEN".to_string())
        })?;

        let user = self.live_user(claims.sub).await?;
        if !user.is_active {
            return Err(RepositoryError::Unauthorized("USER_NOT_VALIDATED".to_string()));
        }

        let company = match user.company_id {
            Some(id) => Some(self.live_company(id).await?),
            None => None,
        };

        SessionContext::authenticated(
            SessionUser::from(&user),
            company.as_ref().map(SessionCompany::from),
        )
    }

    async fn live_user(&self, external_id: Uuid) -> Result<user::Model, RepositoryError> {
        ScopedRepository::<User>::new(self.db)
            .find_one_optional(
                &SessionContext::anonymous(),
                Condition::all().add(user::Column::ExternalId.eq(external_id)),
            )
            .await?
            .ok_or_else(RepositoryError::unauthorized)
    }

    async fn live_company(&self, id: i32) -> Result<company::Model, RepositoryError> {
        ScopedRepository::<Company>::new(self.db)
            .find_one_optional(
                &SessionContext::anonymous(),
                Condition::all().add(company::Column::Id.eq(id)),
            )
            .await?
            .ok_or_else(RepositoryError::unauthorized)
    }
}
