//! Payment order registration and lookup.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::resolve;
use crate::error::RepositoryError;
use crate::models::Provider;
use crate::models::company::Entity as Company;
use crate::models::contract::{self, Entity as Contract};
use crate::models::order::{self, Column, CreditFlag, Entity as Order, PaymentMethod};
use crate::repositories::{
    FilterBuilder, OrderRepository, PageRequest, Paginated, ScopedRepository, company_filter,
};
use crate::session::SessionContext;

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    pub company_id: Uuid,
    /// Must be the current contract of the company
    pub contract_id: Uuid,
    pub payment_method: PaymentMethod,
    #[validate(range(min = 1, max = 24))]
    pub installment: Option<i32>,
    #[validate(range(min = 0.01))]
    pub amount: f64,
    pub credit_flag: Option<CreditFlag>,
    /// Defaults to the time of registration
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct OrderFilter {
    pub provider: Option<Provider>,
    pub payment_method: Option<PaymentMethod>,
    pub start_amount: Option<f64>,
    pub end_amount: Option<f64>,
    pub company_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    /// Inclusive completion-date bounds (UTC calendar days)
    pub start_completed_at: Option<NaiveDate>,
    pub end_completed_at: Option<NaiveDate>,
    #[serde(default)]
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub provider: Provider,
    pub payment_method: PaymentMethod,
    pub installment: Option<i32>,
    pub amount: f64,
    pub credit_flag: Option<CreditFlag>,
    pub contract_id: Uuid,
    pub company_id: Uuid,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

struct References {
    contracts: HashMap<i32, Uuid>,
    companies: HashMap<i32, Uuid>,
}

impl References {
    fn response(&self, model: order::Model) -> OrderResponse {
        OrderResponse {
            id: model.external_id,
            provider: model.provider,
            payment_method: model.payment_method,
            installment: model.installment,
            amount: model.amount,
            credit_flag: model.credit_flag,
            contract_id: self.contracts.get(&model.contract_id).copied().unwrap_or_default(),
            company_id: self.companies.get(&model.company_id).copied().unwrap_or_default(),
            completed_at: model.completed_at.map(|at| at.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

pub struct OrderService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OrderService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    fn repo(&self) -> ScopedRepository<'a, Order> {
        ScopedRepository::new(self.db)
    }

    async fn references(&self, models: &[order::Model]) -> Result<References, RepositoryError> {
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

    pub async fn respond_one(&self, model: order::Model) -> Result<OrderResponse, RepositoryError> {
        let references = self.references(std::slice::from_ref(&model)).await?;
        Ok(references.response(model))
    }

    /// Registers an order against the company's current contract. The provider is
    /// taken from the contract.
    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreateOrderRequest,
    ) -> Result<order::Model, RepositoryError> {
        session.require_admin()?;
        let company =
            resolve::<Company>(self.db, session, request.company_id, "COMPANY_NOT_FOUND").await?;

        let current = company_filter::<Contract>(company.id)
            .add(contract::Column::ExternalId.eq(request.contract_id))
            .add(contract::Column::IsCurrent.eq(true));
        let contract = ScopedRepository::<Contract>::new(self.db)
            .find_one(session, current)
            .await
            .map_err(|e| e.not_found_as("CONTRACT_NOT_FOUND"))?;

        let candidate = order::ActiveModel {
            provider: Set(contract.provider),
            payment_method: Set(request.payment_method),
            installment: Set(request.installment),
            amount: Set(request.amount),
            credit_flag: Set(request.credit_flag),
            contract_id: Set(contract.id),
            company_id: Set(company.id),
            completed_at: Set(request.completed_at.map(Into::into)),
            ..Default::default()
        };

        OrderRepository::new(self.db)
            .create_new_order(session, candidate)
            .await
    }

    pub async fn list(
        &self,
        session: &SessionContext,
        filter: OrderFilter,
    ) -> Result<Paginated<OrderResponse>, RepositoryError> {
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
            .eq(Column::PaymentMethod, filter.payment_method)
            .range(Column::Amount, filter.start_amount, filter.end_amount)
            .eq(Column::CompanyId, company_id)
            .eq(Column::ContractId, contract_id)
            .date_range(
                Column::CompletedAt,
                filter.start_completed_at,
                filter.end_completed_at,
            )
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
    ) -> Result<order::Model, RepositoryError> {
        session.require_user()?;
        self.repo().find_by_external_id(session, id).await
    }

    pub async fn remove(&self, session: &SessionContext, id: Uuid) -> Result<(), RepositoryError> {
        session.require_admin()?;
        let order = self.find_one(session, id).await?;
        self.repo().remove(order.id, false).await
    }
}
