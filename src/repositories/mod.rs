//! # Repository Layer
//!
//! [`ScopedRepository`] is the generic, tenant-aware data-access type shared by every
//! entity. Each entity declares its capabilities statically through [`ScopedEntity`]
//! (and [`TenantScoped`] when it carries a `company_id`), and every scoped call takes
//! the request's [`SessionContext`] explicitly.
//!
//! Scoping rules:
//! - non-admin sessions have `company_id` forced on writes and filtered on reads;
//! - soft-deleted rows are hidden unless [`ScopedRepository::with_deleted`] is used;
//! - primary-key lookups bypass both, for use after ownership was established.

use std::collections::HashMap;
use std::marker::PhantomData;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, IdenStatic, IntoActiveModel, Iterable, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Value,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::session::SessionContext;

pub mod contract;
pub mod filter;
pub mod order;
pub mod pdv;
pub mod resource;
pub mod topic;
pub mod user;

pub use contract::ContractRepository;
pub use filter::FilterBuilder;
pub use order::OrderRepository;
pub use pdv::PdvRepository;
pub use resource::ResourceRepository;
pub use topic::TopicRepository;
pub use user::UserRepository;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Static description of the columns the scoped repository manages for an entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityConfig<C> {
    /// Upper-case name used in error codes (`CONTRACT` gives `CONTRACT_NOT_FOUND`).
    pub name: &'static str,
    pub id: C,
    pub external_id: C,
    pub created_at: C,
    pub updated_at: C,
    /// Tenant column, present only for [`TenantScoped`] entities.
    pub tenant: Option<C>,
    /// Soft-delete marker; entities without one are always hard-deleted.
    pub deleted_at: Option<C>,
}

/// Entity usable through [`ScopedRepository`].
pub trait ScopedEntity: EntityTrait {
    const CONFIG: EntityConfig<Self::Column>;
}

/// Marker for entities owned by a company. Implementors set
/// `tenant: Some(Self::TENANT_COLUMN)` in their [`EntityConfig`].
pub trait TenantScoped: ScopedEntity {
    const TENANT_COLUMN: Self::Column;
}

/// Page selection; missing values fall back to page 1 and 10 rows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }
}

/// One page of results. `page_count` is `ceil(total / limit)`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_count: u64,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_count: self.page_count,
        }
    }
}

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Value of an active-model field unless it is `NotSet`.
pub(crate) fn active_value<V>(value: &ActiveValue<V>) -> Option<V>
where
    V: Clone + Into<Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v.clone()),
        ActiveValue::NotSet => None,
    }
}

/// Generic CRUD over one entity with tenant isolation and soft-delete semantics.
///
/// Generic over the connection so workflows can run it inside a transaction.
pub struct ScopedRepository<'a, E, C = DatabaseConnection> {
    db: &'a C,
    with_deleted: bool,
    _entity: PhantomData<E>,
}

impl<'a, E, C> ScopedRepository<'a, E, C>
where
    E: ScopedEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    C: ConnectionTrait,
{
    pub fn new(db: &'a C) -> Self {
        Self {
            db,
            with_deleted: false,
            _entity: PhantomData,
        }
    }

    /// Includes soft-deleted rows in scoped reads.
    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }

    /// Merges the implicit tenant and soft-delete predicates into `filter`.
    pub fn scope(&self, session: &SessionContext, filter: Condition) -> Condition {
        let mut condition = Condition::all().add(filter);
        if let (Some(column), Some(tenant_id)) = (E::CONFIG.tenant, session.tenant_id()) {
            condition = condition.add(column.eq(tenant_id));
        }
        if !self.with_deleted
            && let Some(column) = E::CONFIG.deleted_at
        {
            condition = condition.add(column.is_null());
        }
        condition
    }

    fn force_tenant(session: &SessionContext, record: &mut E::ActiveModel) {
        if let (Some(column), Some(tenant_id)) = (E::CONFIG.tenant, session.tenant_id()) {
            record.set(column, tenant_id.into());
        }
    }

    fn owned_by_session(session: &SessionContext, model: &E::Model) -> bool {
        match (E::CONFIG.tenant, session.tenant_id()) {
            (Some(column), Some(tenant_id)) => model.get(column) == Value::from(tenant_id),
            _ => true,
        }
    }

    /// Persists a new row with a fresh external id and creation timestamps.
    pub async fn create(
        &self,
        session: &SessionContext,
        mut record: E::ActiveModel,
    ) -> Result<E::Model, RepositoryError> {
        Self::force_tenant(session, &mut record);

        let now = now();
        record.set(E::CONFIG.external_id, Uuid::new_v4().into());
        record.set(E::CONFIG.created_at, now.into());
        record.set(E::CONFIG.updated_at, now.into());

        let model = record
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::debug!(entity = E::CONFIG.name, "row created");
        Ok(model)
    }

    /// All rows matching `filter` within scope, ordered by primary key.
    pub async fn find_all(
        &self,
        session: &SessionContext,
        filter: Condition,
    ) -> Result<Vec<E::Model>, RepositoryError> {
        E::find()
            .filter(self.scope(session, filter))
            .order_by_asc(E::CONFIG.id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_paginated(
        &self,
        session: &SessionContext,
        filter: Condition,
        request: PageRequest,
    ) -> Result<Paginated<E::Model>, RepositoryError> {
        let page = request.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(RepositoryError::invalid_input(
                "limit must be greater than zero",
            ));
        }
        let in_range = i64::try_from(limit).is_ok()
            && (page - 1)
                .checked_mul(limit)
                .is_some_and(|offset| i64::try_from(offset).is_ok());
        if !in_range {
            return Err(RepositoryError::invalid_input("page is out of range"));
        }

        let paginator = E::find()
            .filter(self.scope(session, filter))
            .order_by_asc(E::CONFIG.id)
            .paginate(self.db, limit);

        let totals = paginator
            .num_items_and_pages()
            .await
            .map_err(RepositoryError::database_error)?;
        let data = paginator
            .fetch_page(page - 1)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(Paginated {
            data,
            total: totals.number_of_items,
            page,
            page_count: totals.number_of_pages,
        })
    }

    /// First row matching `filter` within scope, if any.
    pub async fn find_one_optional(
        &self,
        session: &SessionContext,
        filter: Condition,
    ) -> Result<Option<E::Model>, RepositoryError> {
        E::find()
            .filter(self.scope(session, filter))
            .order_by_asc(E::CONFIG.id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Like [`Self::find_one_optional`] but a miss is `NotFound`.
    pub async fn find_one(
        &self,
        session: &SessionContext,
        filter: Condition,
    ) -> Result<E::Model, RepositoryError> {
        self.find_one_optional(session, filter)
            .await?
            .ok_or_else(|| RepositoryError::not_found(E::CONFIG.name))
    }

    pub async fn find_by_external_id(
        &self,
        session: &SessionContext,
        external_id: Uuid,
    ) -> Result<E::Model, RepositoryError> {
        self.find_one(
            session,
            Condition::all().add(E::CONFIG.external_id.eq(external_id)),
        )
        .await
    }

    /// Direct lookup by storage key, ignoring tenant and soft-delete scoping.
    pub async fn find_by_primary_key(&self, id: i32) -> Result<E::Model, RepositoryError> {
        E::find()
            .filter(E::CONFIG.id.eq(id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found(E::CONFIG.name))
    }

    /// Maps primary keys to external ids, ignoring scoping.
    pub async fn external_ids(&self, ids: Vec<i32>) -> Result<HashMap<i32, Uuid>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let config = E::CONFIG;
        let rows: Vec<(i32, Uuid)> = E::find()
            .select_only()
            .column(config.id)
            .column(config.external_id)
            .filter(config.id.is_in(ids))
            .into_tuple()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(rows.into_iter().collect())
    }

    pub async fn count(
        &self,
        session: &SessionContext,
        filter: Condition,
    ) -> Result<u64, RepositoryError> {
        E::find()
            .filter(self.scope(session, filter))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Merges every `Set` field of `patch` into the row and saves it.
    ///
    /// The tenant column is forced again for non-admin sessions, and a row owned by
    /// another tenant is reported as `NotFound`.
    pub async fn update(
        &self,
        session: &SessionContext,
        id: i32,
        mut patch: E::ActiveModel,
    ) -> Result<E::Model, RepositoryError> {
        Self::force_tenant(session, &mut patch);

        let current = self.find_by_primary_key(id).await?;
        if !Self::owned_by_session(session, &current) {
            return Err(RepositoryError::not_found(E::CONFIG.name));
        }

        let config = E::CONFIG;
        let immutable = [config.id, config.external_id, config.created_at];

        let mut active = current.into_active_model();
        for column in E::Column::iter() {
            if immutable.iter().any(|c| c.as_str() == column.as_str()) {
                continue;
            }
            if let ActiveValue::Set(value) = patch.get(column) {
                active.set(column, value);
            }
        }
        active.set(E::CONFIG.updated_at, now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Soft-deletes the row, or deletes it physically when `hard_delete` is set or the
    /// entity has no soft-delete column.
    pub async fn remove(&self, id: i32, hard_delete: bool) -> Result<(), RepositoryError> {
        let current = self.find_by_primary_key(id).await?;

        match E::CONFIG.deleted_at {
            Some(deleted_at) if !hard_delete => {
                let now = now();
                let mut active = current.into_active_model();
                active.set(deleted_at, now.into());
                active.set(E::CONFIG.updated_at, now.into());
                active
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
            }
            _ => {
                E::delete_many()
                    .filter(E::CONFIG.id.eq(id))
                    .exec(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
            }
        }

        tracing::debug!(entity = E::CONFIG.name, id, hard_delete, "row removed");
        Ok(())
    }
}

/// Predicate selecting the rows of one company.
pub fn company_filter<E: TenantScoped>(company_id: i32) -> Condition {
    Condition::all().add(E::TENANT_COLUMN.eq(company_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, Set};

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn company(name: &str, revenue_record: &str) -> company::ActiveModel {
        company::ActiveModel {
            name: Set(name.to_string()),
            social_name: Set(format!("{name} Ltda")),
            revenue_record: Set(revenue_record.to_string()),
            payment_method: Set("boleto".to_string()),
            email: Set(format!("{}@example.com", name.to_lowercase())),
            is_active: Set(true),
            main_contact: Set("Maria".to_string()),
            address: Set("Rua A, 1".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_external_id_and_timestamps() {
        let db = setup().await;
        let repo = ScopedRepository::<company::Entity>::new(&db);

        let created = repo
            .create(&SessionContext::anonymous(), company("Acme", "12345678000190"))
            .await
            .unwrap();

        assert!(!created.external_id.is_nil());
        assert_eq!(created.created_at, created.updated_at);
        assert!(created.deleted_at.is_none());
    }

    #[tokio::test]
    async fn update_does_not_touch_identity_columns() {
        let db = setup().await;
        let repo = ScopedRepository::<company::Entity>::new(&db);
        let session = SessionContext::anonymous();
        let created = repo
            .create(&session, company("Acme", "12345678000190"))
            .await
            .unwrap();

        let patch = company::ActiveModel {
            name: Set("Acme Renamed".to_string()),
            external_id: Set(Uuid::new_v4()),
            ..Default::default()
        };
        let updated = repo.update(&session, created.id, patch).await.unwrap();

        assert_eq!(updated.name, "Acme Renamed");
        assert_eq!(updated.external_id, created.external_id);
        assert_eq!(updated.revenue_record, created.revenue_record);
    }

    #[tokio::test]
    async fn paginate_rejects_zero_limit() {
        let db = setup().await;
        let repo = ScopedRepository::<company::Entity>::new(&db);

        let result = repo
            .find_paginated(
                &SessionContext::anonymous(),
                Condition::all(),
                PageRequest::new(1, 0),
            )
            .await;

        assert!(matches!(result, Err(RepositoryError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn paginate_rejects_page_beyond_addressable_offsets() {
        let db = setup().await;
        let repo = ScopedRepository::<company::Entity>::new(&db);
        let session = SessionContext::anonymous();

        for request in [
            PageRequest::new(u64::MAX / 2, 10),
            PageRequest::new(u64::MAX, 1),
            PageRequest::new(1, u64::MAX),
        ] {
            let result = repo
                .find_paginated(&session, Condition::all(), request)
                .await;
            assert!(matches!(result, Err(RepositoryError::InvalidInput(_))));
        }

        let last = repo
            .find_paginated(&session, Condition::all(), PageRequest::new(1_000, 10))
            .await
            .unwrap();
        assert!(last.data.is_empty());
        assert_eq!(last.page, 1_000);
    }

    #[tokio::test]
    async fn soft_remove_hides_row_but_keeps_it_stored() {
        let db = setup().await;
        let repo = ScopedRepository::<company::Entity>::new(&db);
        let session = SessionContext::anonymous();
        let created = repo
            .create(&session, company("Acme", "12345678000190"))
            .await
            .unwrap();

        repo.remove(created.id, false).await.unwrap();

        let lookup = repo.find_by_external_id(&session, created.external_id).await;
        assert!(matches!(lookup, Err(RepositoryError::NotFound(ref code)) if code == "COMPANY_NOT_FOUND"));
        let stored = repo.find_by_primary_key(created.id).await.unwrap();
        assert!(stored.deleted_at.is_some());
        let visible = repo
            .with_deleted()
            .find_by_external_id(&session, created.external_id)
            .await
            .unwrap();
        assert_eq!(visible.id, created.id);
    }

    #[tokio::test]
    async fn hard_remove_deletes_the_row() {
        let db = setup().await;
        let repo = ScopedRepository::<company::Entity>::new(&db);
        let created = repo
            .create(&SessionContext::anonymous(), company("Acme", "12345678000190"))
            .await
            .unwrap();

        repo.remove(created.id, true).await.unwrap();

        let lookup = repo.find_by_primary_key(created.id).await;
        assert!(matches!(lookup, Err(RepositoryError::NotFound(_))));
        let remaining = ScopedRepository::<company::Entity>::new(&db)
            .with_deleted()
            .count(&SessionContext::anonymous(), Condition::all())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn paginated_map_keeps_counts() {
        let page = Paginated {
            data: vec![1, 2, 3],
            total: 13,
            page: 2,
            page_count: 5,
        };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.data, vec![10, 20, 30]);
        assert_eq!((mapped.total, mapped.page, mapped.page_count), (13, 2, 5));
    }
}
