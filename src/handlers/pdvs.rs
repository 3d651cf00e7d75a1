//! # Pdvs API Handlers

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
use crate::services::PdvService;
use crate::services::pdv::{CreatePdvRequest, PdvFilter, PdvResponse, UpdatePdvRequest};
use crate::session::SessionContext;

/// Provision a pdv under the company's current contract (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/pdvs",
    security(("bearer_auth" = [])),
    request_body = CreatePdvRequest,
    responses(
        (status = 201, description = "Pdv created", body = PdvResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Company or current contract not found", body = ApiError),
        (status = 409, description = "Serial number already used", body = ApiError)
    ),
    tag = "pdvs"
)]
pub async fn create_pdv(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<CreatePdvRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PdvResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = PdvService::new(&state.db);
    let created = service.create(&session, request).await?;
    Ok((StatusCode::CREATED, Json(service.respond_one(created).await?)))
}

#[utoipa::path(
    post,
    path = "/api/v1/pdvs/list",
    security(("bearer_auth" = [])),
    request_body = PdvFilter,
    responses(
        (status = 200, description = "One page of pdvs", body = Paginated<PdvResponse>),
        (status = 400, description = "Invalid filter", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "pdvs"
)]
pub async fn list_pdvs(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<PdvFilter>, JsonRejection>,
) -> Result<Json<Paginated<PdvResponse>>, ApiError> {
    let Json(filter) = payload?;
    Ok(Json(PdvService::new(&state.db).list(&session, filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/pdvs/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Pdv id")),
    responses(
        (status = 200, description = "Pdv", body = PdvResponse),
        (status = 404, description = "Pdv not found", body = ApiError)
    ),
    tag = "pdvs"
)]
pub async fn get_pdv(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<PdvResponse>, ApiError> {
    let service = PdvService::new(&state.db);
    let pdv = service.find_one(&session, id).await?;
    Ok(Json(service.respond_one(pdv).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/pdvs/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Pdv id")),
    request_body = UpdatePdvRequest,
    responses(
        (status = 200, description = "Pdv updated", body = PdvResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Pdv not found", body = ApiError),
        (status = 409, description = "Serial number already used", body = ApiError)
    ),
    tag = "pdvs"
)]
pub async fn update_pdv(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePdvRequest>, JsonRejection>,
) -> Result<Json<PdvResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = PdvService::new(&state.db);
    let updated = service.update(&session, id, request).await?;
    Ok(Json(service.respond_one(updated).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/pdvs/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Pdv id")),
    responses(
        (status = 204, description = "Pdv removed"),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Pdv not found", body = ApiError)
    ),
    tag = "pdvs"
)]
pub async fn remove_pdv(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    PdvService::new(&state.db).remove(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
