//! # Orders API Handlers

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
use crate::services::OrderService;
use crate::services::order::{CreateOrderRequest, OrderFilter, OrderResponse};
use crate::session::SessionContext;

/// Register a payment order against a current contract (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order registered", body = OrderResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Company or current contract not found", body = ApiError),
        (status = 409, description = "Duplicate order", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = OrderService::new(&state.db);
    let created = service.create(&session, request).await?;
    Ok((StatusCode::CREATED, Json(service.respond_one(created).await?)))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/list",
    security(("bearer_auth" = [])),
    request_body = OrderFilter,
    responses(
        (status = 200, description = "One page of orders", body = Paginated<OrderResponse>),
        (status = 400, description = "Invalid filter", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<OrderFilter>, JsonRejection>,
) -> Result<Json<Paginated<OrderResponse>>, ApiError> {
    let Json(filter) = payload?;
    Ok(Json(OrderService::new(&state.db).list(&session, filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Order not found", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let service = OrderService::new(&state.db);
    let order = service.find_one(&session, id).await?;
    Ok(Json(service.respond_one(order).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order removed"),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Order not found", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn remove_order(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    OrderService::new(&state.db).remove(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
