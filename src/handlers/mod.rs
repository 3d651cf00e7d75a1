//! # API Handlers
//!
//! HTTP endpoint handlers for the back-office API. Handlers validate the request body,
//! hand the [`SessionContext`](crate::session::SessionContext) to the matching service
//! and map the result to a response DTO.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db;
use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod auth;
pub mod companies;
pub mod contracts;
pub mod orders;
pub mod pdvs;
pub mod resources;
pub mod topics;
pub mod users;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub database: String,
}

/// Liveness probe including the database connection
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service and database are healthy", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    db::health_check(&state.db).await.map_err(|error| {
        tracing::warn!(%error, "health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database service unavailable",
        )
    })?;

    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        database: "ok".to_string(),
    }))
}

#[cfg(test)]
mod tests;
