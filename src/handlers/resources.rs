//! # Resources API Handlers

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::server::AppState;
use crate::services::ResourceService;
use crate::services::resource::{
    CreateResourceRequest, ResourceResponse, UpdateResourceRequest,
};
use crate::session::SessionContext;

/// Register a knowledge-base link (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/resources",
    security(("bearer_auth" = [])),
    request_body = CreateResourceRequest,
    responses(
        (status = 201, description = "Resource created", body = ResourceResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Topic not found", body = ApiError),
        (status = 409, description = "Url already registered", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn create_resource(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ResourceResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = ResourceService::new(&state.db);
    let created = service.create(&session, request).await?;
    Ok((StatusCode::CREATED, Json(service.respond(created).await?)))
}

#[utoipa::path(
    get,
    path = "/api/v1/resources",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Resources", body = [ResourceResponse]),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn list_resources(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<Vec<ResourceResponse>>, ApiError> {
    Ok(Json(ResourceService::new(&state.db).find_all(&session).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/resources/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Resource", body = ResourceResponse),
        (status = 404, description = "Resource not found", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn get_resource(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ResourceResponse>, ApiError> {
    let service = ResourceService::new(&state.db);
    let resource = service.find_one(&session, id).await?;
    Ok(Json(service.respond(resource).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/resources/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Resource id")),
    request_body = UpdateResourceRequest,
    responses(
        (status = 200, description = "Resource updated", body = ResourceResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Resource not found", body = ApiError),
        (status = 409, description = "Url already registered", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn update_resource(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateResourceRequest>, JsonRejection>,
) -> Result<Json<ResourceResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = ResourceService::new(&state.db);
    let updated = service.update(&session, id, request).await?;
    Ok(Json(service.respond(updated).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/resources/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 204, description = "Resource removed"),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Resource not found", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn remove_resource(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ResourceService::new(&state.db).remove(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
