//! # Authentication and Authorization
//!
//! JWT bearer authentication for the API. [`Authenticator`] issues and verifies HS256
//! tokens; [`session_middleware`] turns a valid `Authorization: Bearer <jwt>` header into
//! a [`SessionContext`] request extension that handlers extract directly.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::models::user::UserRole;
use crate::server::AppState;
use crate::services::AuthService;
use crate::session::SessionContext;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret is not configured")]
    MissingSecret,
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// External id of the user
    pub sub: Uuid,
    /// External id of the user's company
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Uuid>,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl Authenticator {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_seconds,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        let secret = config.jwt_secret.as_deref().ok_or(AuthError::MissingSecret)?;
        Ok(Self::new(secret, config.jwt_ttl_seconds))
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn issue(
        &self,
        user: Uuid,
        company: Option<Uuid>,
        role: UserRole,
    ) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user,
            company,
            role,
            iat,
            exp: iat + self.ttl_seconds as i64,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }
}

/// Authenticates the request and stores its [`SessionContext`] as an extension.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?.to_owned();

    let session = AuthService::new(&state.db, &state.authenticator)
        .authenticate(&token)
        .await?;

    if let Some(user) = session.user() {
        tracing::debug!(user_id = %user.external_id, role = ?user.role, "authenticated request");
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?
        .strip_prefix("Bearer ")
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}
