//! # Topics API Handlers

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::server::AppState;
use crate::services::TopicService;
use crate::services::topic::{
    CreateTopicRequest, TopicResponse, TopicTreeNode, UpdateTopicRequest,
};
use crate::session::SessionContext;

/// Create a root topic (admin or manager)
#[utoipa::path(
    post,
    path = "/api/v1/topics",
    security(("bearer_auth" = [])),
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Topic created", body = TopicResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "topics"
)]
pub async fn create_topic(
    State(state): State<AppState>,
    session: SessionContext,
    payload: Result<Json<CreateTopicRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TopicResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = TopicService::new(&state.db);
    let created = service.create(&session, request).await?;
    Ok((StatusCode::CREATED, Json(service.respond(created).await?)))
}

/// Create a sub-topic under a root topic (admin or manager)
#[utoipa::path(
    post,
    path = "/api/v1/topics/{id}/sub-topics",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Parent topic id")),
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Sub-topic created", body = TopicResponse),
        (status = 400, description = "Parent is itself a sub-topic", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Parent topic not found", body = ApiError)
    ),
    tag = "topics"
)]
pub async fn create_sub_topic(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<CreateTopicRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TopicResponse>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = TopicService::new(&state.db);
    let created = service.create_sub_topic(&session, id, request).await?;
    Ok((StatusCode::CREATED, Json(service.respond(created).await?)))
}

/// Root topics with their sub-topics
#[utoipa::path(
    get,
    path = "/api/v1/topics/tree",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Topic tree", body = [TopicTreeNode]),
        (status = 401, description = "Not authorized", body = ApiError)
    ),
    tag = "topics"
)]
pub async fn topic_tree(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<Vec<TopicTreeNode>>, ApiError> {
    Ok(Json(TopicService::new(&state.db).tree(&session).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/topics/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Topic with its sub-topics", body = TopicTreeNode),
        (status = 404, description = "Topic not found", body = ApiError)
    ),
    tag = "topics"
)]
pub async fn get_topic(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<Json<TopicTreeNode>, ApiError> {
    let node = TopicService::new(&state.db)
        .find_one_with_sub_topics(&session, id)
        .await?;
    Ok(Json(node))
}

#[utoipa::path(
    patch,
    path = "/api/v1/topics/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Topic id")),
    request_body = UpdateTopicRequest,
    responses(
        (status = 200, description = "Topic updated", body = TopicResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Topic not found", body = ApiError)
    ),
    tag = "topics"
)]
pub async fn update_topic(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTopicRequest>, JsonRejection>,
) -> Result<Json<TopicResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let service = TopicService::new(&state.db);
    let updated = service.update(&session, id, request).await?;
    Ok(Json(service.respond(updated).await?))
}

/// Remove a topic together with its sub-topics
#[utoipa::path(
    delete,
    path = "/api/v1/topics/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Topic id")),
    responses(
        (status = 204, description = "Topic removed"),
        (status = 401, description = "Not authorized", body = ApiError),
        (status = 404, description = "Topic not found", body = ApiError)
    ),
    tag = "topics"
)]
pub async fn remove_topic(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    TopicService::new(&state.db).remove(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
