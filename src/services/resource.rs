//! Knowledge-base resources (links to videos, articles and pdfs).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::resolve;
use crate::error::RepositoryError;
use crate::models::resource::{self, Column, Entity as Resource, ResourceType};
use crate::models::topic::Entity as Topic;
use crate::repositories::{ResourceRepository, ScopedRepository};
use crate::session::SessionContext;

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateResourceRequest {
    pub topic_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[validate(url(message = "INVALID_URL"))]
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateResourceRequest {
    pub topic_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<ResourceType>,
    #[validate(url(message = "INVALID_URL"))]
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResourceResponse {
    pub id: Uuid,
    pub topic_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    pub url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ResourceResponse {
    fn new(model: resource::Model, topics: &HashMap<i32, Uuid>) -> Self {
        Self {
            id: model.external_id,
            topic_id: model.topic_id.and_then(|id| topics.get(&id).copied()),
            kind: model.kind,
            url: model.url,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

pub struct ResourceService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ResourceService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    fn repo(&self) -> ScopedRepository<'a, Resource> {
        ScopedRepository::new(self.db)
    }

    async fn respond_all(
        &self,
        models: Vec<resource::Model>,
    ) -> Result<Vec<ResourceResponse>, RepositoryError> {
        let topics = ScopedRepository::<Topic>::new(self.db)
            .external_ids(models.iter().filter_map(|m| m.topic_id).collect())
            .await?;
        Ok(models
            .into_iter()
            .map(|m| ResourceResponse::new(m, &topics))
            .collect())
    }

    pub async fn respond(&self, model: resource::Model) -> Result<ResourceResponse, RepositoryError> {
        let mut responses = self.respond_all(vec![model]).await?;
        responses
            .pop()
            .ok_or_else(|| RepositoryError::not_found("RESOURCE"))
    }

    async fn topic_id(
        &self,
        session: &SessionContext,
        topic_id: Option<Uuid>,
    ) -> Result<Option<i32>, RepositoryError> {
        match topic_id {
            Some(id) => Ok(Some(
                resolve::<Topic>(self.db, session, id, "TOPIC_NOT_FOUND").await?.id,
            )),
            None => Ok(None),
        }
    }

    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreateResourceRequest,
    ) -> Result<resource::Model, RepositoryError> {
        session.require_admin()?;
        let topic_id = self.topic_id(session, request.topic_id).await?;

        let candidate = resource::ActiveModel {
            topic_id: Set(topic_id),
            kind: Set(request.kind),
            url: Set(request.url.trim().to_string()),
            description: Set(request.description),
            ..Default::default()
        };
        ResourceRepository::new(self.db)
            .create_new_resource(session, candidate)
            .await
    }

    pub async fn find_all(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<ResourceResponse>, RepositoryError> {
        session.require_user()?;
        let resources = self.repo().find_all(session, Condition::all()).await?;
        self.respond_all(resources).await
    }

    pub async fn find_one(
        &self,
        session: &SessionContext,
        id: Uuid,
    ) -> Result<resource::Model, RepositoryError> {
        session.require_user()?;
        self.repo().find_by_external_id(session, id).await
    }

    pub async fn update(
        &self,
        session: &SessionContext,
        id: Uuid,
        request: UpdateResourceRequest,
    ) -> Result<resource::Model, RepositoryError> {
        session.require_admin()?;
        let current = self.find_one(session, id).await?;

        let mut patch = resource::ActiveModel::default();
        if request.topic_id.is_some() {
            patch.topic_id = Set(self.topic_id(session, request.topic_id).await?);
        }
        if let Some(kind) = request.kind {
            patch.kind = Set(kind);
        }
        if let Some(url) = request.url {
            let url = url.trim().to_string();
            let taken = self
                .repo()
                .count(
                    session,
                    Condition::all()
                        .add(Column::Url.eq(url.clone()))
                        .add(Column::Id.ne(current.id)),
                )
                .await?;
            if taken > 0 {
                return Err(RepositoryError::conflict("RESOURCE_ALREADY_EXISTS"));
            }
            patch.url = Set(url);
        }
        if let Some(description) = request.description {
            patch.description = Set(Some(description));
        }

        self.repo().update(session, current.id, patch).await
    }

    pub async fn remove(&self, session: &SessionContext, id: Uuid) -> Result<(), RepositoryError> {
        session.require_admin()?;
        let resource = self.find_one(session, id).await?;
        self.repo().remove(resource.id, false).await
    }
}
