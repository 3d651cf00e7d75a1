//! Point-of-sale device provisioning.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::resolve;
use crate::error::RepositoryError;
use crate::models::Provider;
use crate::models::company::Entity as Company;
use crate::models::contract::Entity as Contract;
use crate::models::pdv::{self, Column, Entity as Pdv, PdvStatus};
use crate::repositories::{
    ContractRepository, FilterBuilder, PageRequest, Paginated, PdvRepository, ScopedRepository,
};
use crate::session::SessionContext;

fn default_status() -> PdvStatus {
    PdvStatus::Active
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreatePdvRequest {
    pub company_id: Uuid,
    pub provider: Provider,
    #[serde(default = "default_status")]
    pub status: PdvStatus,
    #[validate(length(min = 1, max = 64, message = "required"))]
    pub serial_number: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdatePdvRequest {
    pub status: Option<PdvStatus>,
    #[validate(length(min = 1, max = 64))]
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct PdvFilter {
    pub provider: Option<Provider>,
    pub status: Option<PdvStatus>,
    pub serial_number: Option<String>,
    pub company_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    #[serde(default)]
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PdvResponse {
    pub id: Uuid,
    pub provider: Provider,
    pub status: PdvStatus,
    pub serial_number: String,
    pub contract_id: Uuid,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// External ids of the rows pdvs point to.
struct References {
    contracts: HashMap<i32, Uuid>,
    companies: HashMap<i32, Uuid>,
}

impl References {
    fn response(&self, model: pdv::Model) -> PdvResponse {
        PdvResponse {
            id: model.external_id,
            provider: model.provider,
            status: model.status,
            serial_number: model.serial_number,
            contract_id: self.contracts.get(&model.contract_id).copied().unwrap_or_default(),
            company_id: self.companies.get(&model.company_id).copied().unwrap_or_default(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

pub struct PdvService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PdvService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    fn repo(&self) -> ScopedRepository<'a, Pdv> {
        ScopedRepository::new(self.db)
    }

    async fn references(&self, models: &[pdv::Model]) -> Result<References, RepositoryError> {
        let contracts = ScopedRepository::<Contract>::new(self.db)
            .external_ids(models.iter().map(|m| m.contract_id).collect())
            .await?;
        let companies = ScopedRepository::<Company>::new(self.db)
            .external_ids(models.iter().map(|m| m.company_id).collect())
            .await?;
        Ok(References {
            contracts,
            companies,
        })
    }

    pub async fn respond_one(&self, model: pdv::Model) -> Result<PdvResponse, RepositoryError> {
        let references = self.references(std::slice::from_ref(&model)).await?;
        Ok(references.response(model))
    }

    /// Provisions a pdv under the current contract of its (company, provider).
    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreatePdvRequest,
    ) -> Result<pdv::Model, RepositoryError> {
        session.require_admin()?;
        let company =
            resolve::<Company>(self.db, session, request.company_id, "COMPANY_NOT_FOUND").await?;
        let contract = ContractRepository::new(self.db)
            .current_contract(session, company.id, request.provider)
            .await
            .map_err(|e| e.not_found_as("CONTRACT_NOT_FOUND"))?;

        let candidate = pdv::ActiveModel {
            provider: Set(request.provider),
            status: Set(request.status),
            serial_number: Set(request.serial_number.trim().to_string()),
            contract_id: Set(contract.id),
            company_id: Set(company.id),
            ..Default::default()
        };

        PdvRepository::new(self.db)
            .create_new_pdv(session, candidate)
            .await
    }

    pub async fn list(
        &self,
        session: &SessionContext,
        filter: PdvFilter,
    ) -> Result<Paginated<PdvResponse>, RepositoryError> {
        session.require_user()?;

        let company_id = match filter.company_id {
            Some(id) => Some(resolve::<Company>(self.db, session, id, "COMPANY_NOT_FOUND").await?.id),
            None => None,
        };
        let contract_id = match filter.contract_id {
            Some(id) => {
                Some(resolve::<Contract>(self.db, session, id, "CONTRACT_NOT_FOUND").await?.id)
            }
            None => None,
        };

        let condition = FilterBuilder::new()
            .eq(Column::Provider, filter.provider)
            .eq(Column::Status, filter.status)
            .contains(Column::SerialNumber, filter.serial_number.as_deref())
            .eq(Column::CompanyId, company_id)
            .eq(Column::ContractId, contract_id)
            .build();

        let page = self
            .repo()
            .find_paginated(session, condition, filter.pagination)
            .await?;
        let references = self.references(&page.data).await?;
        Ok(page.map(|m| references.response(m)))
    }

    pub async fn find_one(
        &self,
        session: &SessionContext,
        id: Uuid,
    ) -> Result<pdv::Model, RepositoryError> {
        session.require_user()?;
        self.repo().find_by_external_id(session, id).await
    }

    pub async fn update(
        &self,
        session: &SessionContext,
        id: Uuid,
        request: UpdatePdvRequest,
    ) -> Result<pdv::Model, RepositoryError> {
        session.require_admin()?;
        let pdv = self.find_one(session, id).await?;

        let mut patch = pdv::ActiveModel::default();
        if let Some(status) = request.status {
            patch.status = Set(status);
        }
        if let Some(serial_number) = request.serial_number {
            let serial_number = serial_number.trim().to_string();
            let taken = self
                .repo()
                .with_deleted()
                .count(
                    session,
                    Condition::all()
                        .add(Column::SerialNumber.eq(serial_number.clone()))
                        .add(Column::Id.ne(pdv.id)),
                )
                .await?;
            if taken > 0 {
                return Err(RepositoryError::conflict("SERIAL_NUMBER_ALREADY_EXISTS"));
            }
            patch.serial_number = Set(serial_number);
        }

        self.repo().update(session, pdv.id, patch).await
    }

    pub async fn remove(&self, session: &SessionContext, id: Uuid) -> Result<(), RepositoryError> {
        session.require_admin()?;
        let pdv = self.find_one(session, id).await?;
        self.repo().remove(pdv.id, false).await
    }
}
