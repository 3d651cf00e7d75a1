//! Knowledge-base topics.
//!
//! Topics are shared by every tenant. Admins and managers write, any authenticated
//! user reads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::resolve;
use crate::error::RepositoryError;
use crate::models::topic::{self, Entity as Topic};
use crate::models::user::UserRole;
use crate::repositories::{ScopedRepository, TopicRepository};
use crate::session::SessionContext;

const EDITORS: &[UserRole] = &[UserRole::Admin, UserRole::Manager];

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateTopicRequest {
    #[validate(length(min = 1, max = 255, message = "REQUIRED_NAME"))]
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateTopicRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopicResponse {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub version: i32,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TopicResponse {
    fn new(model: topic::Model, parent_id: Option<Uuid>) -> Self {
        Self {
            id: model.external_id,
            name: model.name,
            content: model.content,
            version: model.version,
            parent_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// A root topic with its sub-topics.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopicTreeNode {
    #[serde(flatten)]
    pub topic: TopicResponse,
    pub sub_topics: Vec<TopicResponse>,
}

pub struct TopicService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TopicService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    fn repo(&self) -> ScopedRepository<'a, Topic> {
        ScopedRepository::new(self.db)
    }

    pub async fn respond(&self, model: topic::Model) -> Result<TopicResponse, RepositoryError> {
        let parent_id = match model.parent_topic_id {
            Some(id) => self.repo().external_ids(vec![id]).await?.get(&id).copied(),
            None => None,
        };
        Ok(TopicResponse::new(model, parent_id))
    }

    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreateTopicRequest,
    ) -> Result<topic::Model, RepositoryError> {
        session.require_any_role(EDITORS)?;

        let candidate = topic::ActiveModel {
            name: Set(request.name.trim().to_string()),
            content: Set(request.content),
            parent_topic_id: Set(None),
            ..Default::default()
        };
        TopicRepository::new(self.db)
            .create_new_topic(session, candidate)
            .await
    }

    /// Creates a topic under `parent_id`, which must be a root topic.
    pub async fn create_sub_topic(
        &self,
        session: &SessionContext,
        parent_id: Uuid,
        request: CreateTopicRequest,
    ) -> Result<topic::Model, RepositoryError> {
        session.require_any_role(EDITORS)?;
        let parent = resolve::<Topic>(self.db, session, parent_id, "TOPIC_NOT_FOUND").await?;

        let candidate = topic::ActiveModel {
            name: Set(request.name.trim().to_string()),
            content: Set(request.content),
            parent_topic_id: Set(Some(parent.id)),
            ..Default::default()
        };
        TopicRepository::new(self.db)
            .create_new_topic(session, candidate)
            .await
    }

    pub async fn update(
        &self,
        session: &SessionContext,
        id: Uuid,
        request: UpdateTopicRequest,
    ) -> Result<topic::Model, RepositoryError> {
        session.require_any_role(EDITORS)?;
        let current = resolve::<Topic>(self.db, session, id, "TOPIC_NOT_FOUND").await?;

        let mut patch = topic::ActiveModel::default();
        if let Some(name) = request.name {
            patch.name = Set(name.trim().to_string());
        }
        if let Some(content) = request.content {
            patch.content = Set(content);
        }

        TopicRepository::new(self.db)
            .update_topic(session, &current, patch)
            .await
    }

    /// Every live root topic with its live sub-topics.
    pub async fn tree(&self, session: &SessionContext) -> Result<Vec<TopicTreeNode>, RepositoryError> {
        session.require_user()?;
        let topics = TopicRepository::new(self.db);

        let roots = topics.roots(session).await?;
        let children = topics
            .sub_topics(session, roots.iter().map(|root| root.id).collect())
            .await?;

        let mut by_parent: HashMap<i32, Vec<topic::Model>> = HashMap::new();
        for child in children {
            if let Some(parent_id) = child.parent_topic_id {
                by_parent.entry(parent_id).or_default().push(child);
            }
        }

        Ok(roots
            .into_iter()
            .map(|root| {
                let sub_topics = by_parent
                    .remove(&root.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|child| TopicResponse::new(child, Some(root.external_id)))
                    .collect();
                TopicTreeNode {
                    topic: TopicResponse::new(root, None),
                    sub_topics,
                }
            })
            .collect())
    }

    pub async fn find_one_with_sub_topics(
        &self,
        session: &SessionContext,
        id: Uuid,
    ) -> Result<TopicTreeNode, RepositoryError> {
        session.require_user()?;
        let topic = resolve::<Topic>(self.db, session, id, "TOPIC_NOT_FOUND").await?;

        let sub_topics = TopicRepository::new(self.db)
            .sub_topics(session, vec![topic.id])
            .await?
            .into_iter()
            .map(|child| TopicResponse::new(child, Some(topic.external_id)))
            .collect();

        Ok(TopicTreeNode {
            topic: self.respond(topic).await?,
            sub_topics,
        })
    }

    /// Soft-deletes the topic together with its sub-topics.
    pub async fn remove(&self, session: &SessionContext, id: Uuid) -> Result<(), RepositoryError> {
        session.require_any_role(EDITORS)?;
        let topic = resolve::<Topic>(self.db, session, id, "TOPIC_NOT_FOUND").await?;

        let children = TopicRepository::new(self.db)
            .sub_topics(session, vec![topic.id])
            .await?;
        for child in children {
            self.repo().remove(child.id, false).await?;
        }
        self.repo().remove(topic.id, false).await
    }
}
