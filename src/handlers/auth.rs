//! # Authentication Handlers

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use validator::Validate;

use crate::error::ApiError;
use crate::server::AppState;
use crate::services::AuthService;
use crate::services::auth::{LoginRequest, LoginResponse};

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Invalid credentials or user not validated", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let response = AuthService::new(&state.db, &state.authenticator)
        .login(request)
        .await?;
    Ok(Json(response))
}
