//! # Topic Repository
//!
//! Knowledge-base topics form a two-level tree: root topics and their sub-topics.
//! Topics are not tenant-scoped; every edit bumps the topic's version.

use sea_orm::{ColumnTrait, Condition, DatabaseConnection, Set};

use super::{ScopedRepository, active_value};
use crate::error::RepositoryError;
use crate::models::topic::{ActiveModel, Column, Entity as Topic, Model};
use crate::session::SessionContext;

pub struct TopicRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TopicRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a topic at version 1. A parent, when given, must be a live root topic.
    pub async fn create_new_topic(
        &self,
        session: &SessionContext,
        mut candidate: ActiveModel,
    ) -> Result<Model, RepositoryError> {
        let topics = ScopedRepository::<Topic>::new(self.db);

        if let Some(parent_id) = active_value(&candidate.parent_topic_id).flatten() {
            let parent = topics
                .find_one(session, Condition::all().add(Column::Id.eq(parent_id)))
                .await?;
            if parent.parent_topic_id.is_some() {
                return Err(RepositoryError::invalid_input("INVALID_PARENT_TOPIC"));
            }
        }

        candidate.version = Set(1);
        topics.create(session, candidate).await
    }

    /// Merges `patch` into the topic and increments its version.
    pub async fn update_topic(
        &self,
        session: &SessionContext,
        topic: &Model,
        mut patch: ActiveModel,
    ) -> Result<Model, RepositoryError> {
        patch.version = Set(topic.version + 1);
        patch.parent_topic_id = sea_orm::ActiveValue::NotSet;

        ScopedRepository::<Topic>::new(self.db)
            .update(session, topic.id, patch)
            .await
    }

    /// Live root topics, ordered by id.
    pub async fn roots(&self, session: &SessionContext) -> Result<Vec<Model>, RepositoryError> {
        ScopedRepository::<Topic>::new(self.db)
            .find_all(session, Condition::all().add(Column::ParentTopicId.is_null()))
            .await
    }

    /// Live sub-topics of the given parents, ordered by id.
    pub async fn sub_topics(
        &self,
        session: &SessionContext,
        parent_ids: Vec<i32>,
    ) -> Result<Vec<Model>, RepositoryError> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        ScopedRepository::<Topic>::new(self.db)
            .find_all(
                session,
                Condition::all().add(Column::ParentTopicId.is_in(parent_ids)),
            )
            .await
    }
}
