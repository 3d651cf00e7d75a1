//! # Users API Handlers
//!
//! New users start inactive and receive an 8-digit code by e-mail; `PUT
//! /api/v1/users/{id}/validate` is public so the code can be redeemed before the first
//! login.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::repositories::Paginated;
use crate::server::AppState;
use crate::services::UserService;
use crate::services::user::{
    CreateUserRequest, UpdateUserRequest, UserFilter, UserResponse, ValidateCodeRequest,
};
use crate::session::SessionContext;

fn service(state: &AppState) -> UserService<'_> {
    UserService::new(&state.db, &state.config, state.notifier.as_ref())
}

/// Create a user and send the verification code (admin or manager)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created, pending validation", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 409, description = "E-mail or identifier already registered", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = service(&state);
    let created = service.create(&session, request).await?;
    Ok((StatusCode::CREATED, Json(service.respond(created).await?)))
}

/// Redeem a verification code and activate the user
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/validate",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ValidateCodeRequest,
    responses(
        (status = 200, description = "User activated", body = UserResponse),
        (status = 400, description = "Invalid or expired code", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn validate_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ValidateCodeRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = service(&state);
    let user = service.validate(id, &request.code).await?;
    Ok(Json(service.respond(user).await?))
}

/// The authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/users/myself",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "users"
)]
pub async fn myself(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<UserResponse>, ApiError> {
    let service = service(&state);
    let user = service.myself(&session).await?;
    Ok(Json(service.respond(user).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/list",
    security(("bearer_auth" = [])),
    request_body = UserFilter,
    responses(
        (status = 200, description = "One page of users", body = Paginated<UserResponse>),
        (status = 400, description = "Invalid filter", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<UserFilter>, JsonRejection>,
) -> Result<Json<Paginated<UserResponse>>, ApiError> {
    let Json(filter) = payload?;
    Ok(Json(service(&state).list(&session, filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let service = service(&state);
    let user = service.find_one(&session, id).await?;
    Ok(Json(service.respond(user).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = service(&state);
    let updated = service.update(&session, id, request).await?;
    Ok(Json(service.respond(updated).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User removed"),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn remove_user(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    service(&state).remove(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
