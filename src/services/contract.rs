//! Contract administration on top of the versioning workflow.
//!
//! Updating a contract never edits the row: the current terms are copied forward,
//! the patch is laid over them and the result becomes the next version.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{resolve, validate_not_negative};
use crate::error::RepositoryError;
use crate::models::Provider;
use crate::models::company::Entity as Company;
use crate::models::contract::{self, Column, Entity as Contract, PaymentInterval};
use crate::repositories::{
    ContractRepository, FilterBuilder, PageRequest, Paginated, ScopedRepository,
};
use crate::session::SessionContext;

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateContractRequest {
    /// External id of the owning company
    pub company_id: Uuid,
    pub provider: Provider,
    #[validate(custom(function = "validate_not_negative"))]
    pub rent_value: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub debit_tax: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub pix_tax: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub credit_tax: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub credit_low_tax: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub credit_high_tax: Decimal,
    pub payment_interval: PaymentInterval,
    pub main_contact: Option<String>,
}

/// Terms to change in the next version; absent fields carry over.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct ContractPatch {
    #[validate(custom(function = "validate_not_negative"))]
    pub rent_value: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub debit_tax: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub pix_tax: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub credit_tax: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub credit_low_tax: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub credit_high_tax: Option<Decimal>,
    pub payment_interval: Option<PaymentInterval>,
    pub main_contact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct ContractFilter {
    pub provider: Option<Provider>,
    pub company_id: Option<Uuid>,
    /// Only the current version of each pair when `true`
    pub only_current: Option<bool>,
    pub payment_interval: Option<PaymentInterval>,
    /// Inclusive creation-date bounds (UTC calendar days)
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    #[serde(default)]
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContractResponse {
    pub id: Uuid,
    pub provider: Provider,
    pub rent_value: Decimal,
    pub debit_tax: Decimal,
    pub pix_tax: Decimal,
    pub credit_tax: Decimal,
    pub credit_low_tax: Decimal,
    pub credit_high_tax: Decimal,
    pub payment_interval: PaymentInterval,
    pub version: i32,
    pub is_current: bool,
    pub main_contact: Option<String>,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractResponse {
    fn new(model: contract::Model, companies: &HashMap<i32, Uuid>) -> Self {
        Self {
            id: model.external_id,
            provider: model.provider,
            rent_value: model.rent_value,
            debit_tax: model.debit_tax,
            pix_tax: model.pix_tax,
            credit_tax: model.credit_tax,
            credit_low_tax: model.credit_low_tax,
            credit_high_tax: model.credit_high_tax,
            payment_interval: model.payment_interval,
            version: model.version,
            is_current: model.is_current,
            main_contact: model.main_contact,
            company_id: companies
                .get(&model.company_id)
                .copied()
                .unwrap_or_default(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl ContractPatch {
    fn apply(self, candidate: &mut contract::ActiveModel) {
        if let Some(value) = self.rent_value {
            candidate.rent_value = Set(value);
        }
        if let Some(value) = self.debit_tax {
            candidate.debit_tax = Set(value);
        }
        if let Some(value) = self.pix_tax {
            candidate.pix_tax = Set(value);
        }
        if let Some(value) = self.credit_tax {
            candidate.credit_tax = Set(value);
        }
        if let Some(value) = self.credit_low_tax {
            candidate.credit_low_tax = Set(value);
        }
        if let Some(value) = self.credit_high_tax {
            candidate.credit_high_tax = Set(value);
        }
        if let Some(value) = self.payment_interval {
            candidate.payment_interval = Set(value);
        }
        if let Some(value) = self.main_contact {
            candidate.main_contact = Set(Some(value));
        }
    }
}

pub struct ContractService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ContractService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    fn repo(&self) -> ScopedRepository<'a, Contract> {
        ScopedRepository::new(self.db)
    }

    async fn respond(
        &self,
        models: Vec<contract::Model>,
    ) -> Result<Vec<ContractResponse>, RepositoryError> {
        let companies = ScopedRepository::<Company>::new(self.db)
            .external_ids(models.iter().map(|m| m.company_id).collect())
            .await?;
        Ok(models
            .into_iter()
            .map(|m| ContractResponse::new(m, &companies))
            .collect())
    }

    pub async fn respond_one(
        &self,
        model: contract::Model,
    ) -> Result<ContractResponse, RepositoryError> {
        let mut responses = self.respond(vec![model]).await?;
        responses
            .pop()
            .ok_or_else(|| RepositoryError::not_found("CONTRACT"))
    }

    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreateContractRequest,
    ) -> Result<contract::Model, RepositoryError> {
        session.require_admin()?;
        let company =
            resolve::<Company>(self.db, session, request.company_id, "COMPANY_NOT_FOUND").await?;

        let candidate = contract::ActiveModel {
            provider: Set(request.provider),
            rent_value: Set(request.rent_value),
            debit_tax: Set(request.debit_tax),
            pix_tax: Set(request.pix_tax),
            credit_tax: Set(request.credit_tax),
            credit_low_tax: Set(request.credit_low_tax),
            credit_high_tax: Set(request.credit_high_tax),
            payment_interval: Set(request.payment_interval),
            main_contact: Set(request.main_contact),
            company_id: Set(company.id),
            ..Default::default()
        };

        ContractRepository::new(self.db)
            .create_new_contract(session, candidate)
            .await
    }

    pub async fn list(
        &self,
        session: &SessionContext,
        filter: ContractFilter,
    ) -> Result<Paginated<ContractResponse>, RepositoryError> {
        session.require_user()?;

        let company_id = match filter.company_id {
            Some(id) => Some(resolve::<Company>(self.db, session, id, "COMPANY_NOT_FOUND").await?.id),
            None => None,
        };

        let condition = FilterBuilder::new()
            .eq(Column::Provider, filter.provider)
            .eq(Column::CompanyId, company_id)
            .eq(Column::IsCurrent, filter.only_current.filter(|only| *only))
            .eq(Column::PaymentInterval, filter.payment_interval)
            .date_range(Column::CreatedAt, filter.created_from, filter.created_to)
            .build();

        let page = self
            .repo()
            .find_paginated(session, condition, filter.pagination)
            .await?;
        let companies = ScopedRepository::<Company>::new(self.db)
            .external_ids(page.data.iter().map(|m| m.company_id).collect())
            .await?;
        Ok(page.map(|m| ContractResponse::new(m, &companies)))
    }

    pub async fn find_all(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<ContractResponse>, RepositoryError> {
        session.require_user()?;
        let contracts = self
            .repo()
            .find_all(session, sea_orm::Condition::all())
            .await?;
        self.respond(contracts).await
    }

    pub async fn find_one(
        &self,
        session: &SessionContext,
        id: Uuid,
    ) -> Result<contract::Model, RepositoryError> {
        session.require_user()?;
        self.repo().find_by_external_id(session, id).await
    }

    /// Issues the next version of the (company, provider) pair of `id` with `patch`
    /// applied over the terms of the pair's current version.
    ///
    /// `id` may name any version of the pair. When the current version was removed,
    /// the terms of `id` itself are carried forward.
    pub async fn update(
        &self,
        session: &SessionContext,
        id: Uuid,
        patch: ContractPatch,
    ) -> Result<contract::Model, RepositoryError> {
        session.require_admin()?;
        let target = self.find_one(session, id).await?;

        let versions = ContractRepository::new(self.db);
        let base = match versions
            .current_contract(session, target.company_id, target.provider)
            .await
        {
            Ok(current) => current,
            Err(e) if e.is_not_found() => target,
            Err(e) => return Err(e),
        };

        let mut candidate = contract::ActiveModel::from(&base);
        patch.apply(&mut candidate);

        versions.create_new_contract(session, candidate).await
    }

    pub async fn remove(&self, session: &SessionContext, id: Uuid) -> Result<(), RepositoryError> {
        session.require_admin()?;
        let contract = self.find_one(session, id).await?;
        self.repo().remove(contract.id, false).await
    }
}
