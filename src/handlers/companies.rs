//! # Companies API Handlers

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
use crate::services::CompanyService;
use crate::services::company::{
    CompanyFilter, CompanyResponse, CreateCompanyRequest, UpdateCompanyRequest,
};
use crate::session::SessionContext;

/// Register a company (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/companies",
    security(("bearer_auth" = [])),
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 409, description = "Revenue record or e-mail already registered", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let created = CompanyService::new(&state.db).create(&session, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Paginated, filtered company list
#[utoipa::path(
    post,
    path = "/api/v1/companies/list",
    security(("bearer_auth" = [])),
    request_body = CompanyFilter,
    responses(
        (status = 200, description = "One page of companies", body = Paginated<CompanyResponse>),
        (status = 400, description = "Invalid filter", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn list_companies(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<CompanyFilter>, JsonRejection>,
) -> Result<Json<Paginated<CompanyResponse>>, ApiError> {
    let Json(filter) = payload?;
    let page = CompanyService::new(&state.db).list(&session, filter).await?;
    Ok(Json(page))
}

/// Every company visible to the session
#[utoipa::path(
    get,
    path = "/api/v1/companies",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Companies", body = [CompanyResponse]),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn find_all_companies(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<Vec<CompanyResponse>>, ApiError> {
    Ok(Json(CompanyService::new(&state.db).find_all(&session).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company", body = CompanyResponse),
        (status = 404, description = "Company not found", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, ApiError> {
    let company = CompanyService::new(&state.db).find_one(&session, id).await?;
    Ok(Json(company.into()))
}

/// Company owning a contract
#[utoipa::path(
    get,
    path = "/api/v1/companies/by-contract/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Contract id")),
    responses(
        (status = 200, description = "Company", body = CompanyResponse),
        (status = 404, description = "Contract not found", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn get_company_by_contract(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, ApiError> {
    let company = CompanyService::new(&state.db)
        .find_by_contract(&session, id)
        .await?;
    Ok(Json(company.into()))
}

/// Company owning a pdv
#[utoipa::path(
    get,
    path = "/api/v1/companies/by-pdv/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Pdv id")),
    responses(
        (status = 200, description = "Company", body = CompanyResponse),
        (status = 404, description = "Pdv not found", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn get_company_by_pdv(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, ApiError> {
    let company = CompanyService::new(&state.db).find_by_pdv(&session, id).await?;
    Ok(Json(company.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/companies/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = CompanyResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError),
        (status = 409, description = "Revenue record or e-mail already registered", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCompanyRequest>, JsonRejection>,
) -> Result<Json<CompanyResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let updated = CompanyService::new(&state.db)
        .update(&session, id, request)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/companies/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 204, description = "Company removed"),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn remove_company(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    CompanyService::new(&state.db).remove(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
