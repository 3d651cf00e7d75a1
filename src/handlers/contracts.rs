//! # Contracts API Handlers
//!
//! Contracts are versioned: `POST` and `PATCH` both issue a new current version for
//! the (company, provider) pair.

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
use crate::services::ContractService;
use crate::services::contract::{
    ContractFilter, ContractPatch, ContractResponse, CreateContractRequest,
};
use crate::session::SessionContext;

/// Create the next contract version for a company and provider (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/contracts",
    security(("bearer_auth" = [])),
    request_body = CreateContractRequest,
    responses(
        (status = 201, description = "Contract version created", body = ContractResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError)
    ),
    tag = "contracts"
)]
pub async fn create_contract(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<CreateContractRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ContractResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = ContractService::new(&state.db);
    let created = service.create(&session, request).await?;
    Ok((StatusCode::CREATED, Json(service.respond_one(created).await?)))
}

#[utoipa::path(
    post,
    path = "/api/v1/contracts/list",
    security(("bearer_auth" = [])),
    request_body = ContractFilter,
    responses(
        (status = 200, description = "One page of contracts", body = Paginated<ContractResponse>),
        (status = 400, description = "Invalid filter", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "contracts"
)]
pub async fn list_contracts(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<ContractFilter>, JsonRejection>,
) -> Result<Json<Paginated<ContractResponse>>, ApiError> {
    let Json(filter) = payload?;
    Ok(Json(ContractService::new(&state.db).list(&session, filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Contracts", body = [ContractResponse]),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "contracts"
)]
pub async fn find_all_contracts(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<Vec<ContractResponse>>, ApiError> {
    Ok(Json(ContractService::new(&state.db).find_all(&session).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/contracts/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Contract id")),
    responses(
        (status = 200, description = "Contract", body = ContractResponse),
        (status = 404, description = "Contract not found", body = ApiError)
    ),
    tag = "contracts"
)]
pub async fn get_contract(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractResponse>, ApiError> {
    let service = ContractService::new(&state.db);
    let contract = service.find_one(&session, id).await?;
    Ok(Json(service.respond_one(contract).await?))
}

/// Issue a new version with the given terms changed (admin only)
#[utoipa::path(
    patch,
    path = "/api/v1/contracts/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Contract id")),
    request_body = ContractPatch,
    responses(
        (status = 200, description = "New contract version", body = ContractResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Contract not found", body = ApiError)
    ),
    tag = "contracts"
)]
pub async fn update_contract(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<ContractPatch>, JsonRejection>,
) -> Result<Json<ContractResponse>, ApiError> {
    let Json(patch) = payload?;
    patch.validate()?;

    let service = ContractService::new(&state.db);
    let next = service.update(&session, id, patch).await?;
    Ok(Json(service.respond_one(next).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/contracts/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Contract id")),
    responses(
        (status = 204, description = "Contract removed"),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Contract not found", body = ApiError)
    ),
    tag = "contracts"
)]
pub async fn remove_contract(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ContractService::new(&state.db).remove(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
