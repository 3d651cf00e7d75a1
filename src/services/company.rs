//! Company administration.
//!
//! Companies are the tenants. They carry no tenant column, so non-admin sessions are
//! confined here by primary key: a manager or viewer only ever sees their own company.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::resolve;
use crate::error::RepositoryError;
use crate::models::company::{self, Column, Entity as Company};
use crate::models::{Contract, Pdv};
use crate::repositories::{FilterBuilder, PageRequest, Paginated, ScopedRepository};
use crate::session::SessionContext;

fn validate_revenue_record(value: &str) -> Result<(), ValidationError> {
    if value.len() == 14 && value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    let mut err = ValidationError::new("revenue_record");
    err.message = Some("must be exactly 14 digits".into());
    Err(err)
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Acme")]
    pub name: String,
    #[validate(length(min = 1, message = "required"))]
    pub social_name: String,
    #[validate(custom(function = "validate_revenue_record"))]
    #[schema(example = "12345678000190")]
    pub revenue_record: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub payment_method: String,
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[validate(length(min = 1, message = "required"))]
    pub main_contact: String,
    #[validate(length(min = 1, message = "required"))]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub social_name: Option<String>,
    #[validate(custom(function = "validate_revenue_record"))]
    pub revenue_record: Option<String>,
    pub phone: Option<String>,
    #[validate(length(min = 1))]
    pub payment_method: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub is_active: Option<bool>,
    #[validate(length(min = 1))]
    pub main_contact: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub social_name: Option<String>,
    pub revenue_record: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub social_name: String,
    pub revenue_record: String,
    pub phone: Option<String>,
    pub payment_method: String,
    pub email: String,
    pub is_active: bool,
    pub main_contact: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<company::Model> for CompanyResponse {
    fn from(model: company::Model) -> Self {
        Self {
            id: model.external_id,
            name: model.name,
            social_name: model.social_name,
            revenue_record: model.revenue_record,
            phone: model.phone,
            payment_method: model.payment_method,
            email: model.email,
            is_active: model.is_active,
            main_contact: model.main_contact,
            address: model.address,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

pub struct CompanyService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CompanyService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    fn repo(&self) -> ScopedRepository<'a, Company> {
        ScopedRepository::new(self.db)
    }

    /// Restricts non-admin sessions to their own company.
    fn own_company(session: &SessionContext) -> Condition {
        match session.tenant_id() {
            Some(tenant_id) => Condition::all().add(Column::Id.eq(tenant_id)),
            None => Condition::all(),
        }
    }

    async fn ensure_unused(
        &self,
        filter: Condition,
        except: Option<i32>,
        code: &str,
    ) -> Result<(), RepositoryError> {
        let filter = match except {
            Some(id) => filter.add(Column::Id.ne(id)),
            None => filter,
        };
        let taken = self
            .repo()
            .with_deleted()
            .count(&SessionContext::anonymous(), filter)
            .await?;
        if taken > 0 {
            return Err(RepositoryError::conflict(code));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        session: &SessionContext,
        request: CreateCompanyRequest,
    ) -> Result<CompanyResponse, RepositoryError> {
        session.require_admin()?;

        self.ensure_unused(
            Condition::all().add(Column::RevenueRecord.eq(request.revenue_record.clone())),
            None,
            "REVENUE_RECORD_ALREADY_EXISTS",
        )
        .await?;
        let email = request.email.trim().to_lowercase();
        self.ensure_unused(
            Condition::all().add(Column::Email.eq(email.clone())),
            None,
            "EMAIL_ALREADY_EXISTS",
        )
        .await?;

        let candidate = company::ActiveModel {
            name: Set(request.name),
            social_name: Set(request.social_name),
            revenue_record: Set(request.revenue_record),
            phone: Set(request.phone),
            payment_method: Set(request.payment_method),
            email: Set(email),
            is_active: Set(request.is_active),
            main_contact: Set(request.main_contact),
            address: Set(request.address),
            ..Default::default()
        };

        let created = self.repo().create(session, candidate).await?;
        tracing::info!(company_id = %created.external_id, "company created");
        Ok(created.into())
    }

    pub async fn list(
        &self,
        session: &SessionContext,
        filter: CompanyFilter,
    ) -> Result<Paginated<CompanyResponse>, RepositoryError> {
        session.require_user()?;
        let condition = FilterBuilder::new()
            .contains(Column::Name, filter.name.as_deref())
            .contains(Column::SocialName, filter.social_name.as_deref())
            .eq(Column::RevenueRecord, filter.revenue_record)
            .contains(Column::Phone, filter.phone.as_deref())
            .contains(Column::Email, filter.email.as_deref())
            .eq(Column::IsActive, filter.is_active)
            .and(Self::own_company(session))
            .build();

        let page = self
            .repo()
            .find_paginated(session, condition, filter.pagination)
            .await?;
        Ok(page.map(CompanyResponse::from))
    }

    pub async fn find_all(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<CompanyResponse>, RepositoryError> {
        session.require_user()?;
        let companies = self
            .repo()
            .find_all(session, Self::own_company(session))
            .await?;
        Ok(companies.into_iter().map(CompanyResponse::from).collect())
    }

    pub async fn find_one(
        &self,
        session: &SessionContext,
        id: Uuid,
    ) -> Result<company::Model, RepositoryError> {
        let filter = Self::own_company(session).add(Column::ExternalId.eq(id));
        self.repo().find_one(session, filter).await
    }

    /// Company owning the contract, if the contract is visible to the session.
    pub async fn find_by_contract(
        &self,
        session: &SessionContext,
        contract_id: Uuid,
    ) -> Result<company::Model, RepositoryError> {
        let contract = resolve::<Contract>(self.db, session, contract_id, "CONTRACT_NOT_FOUND").await?;
        self.repo().find_by_primary_key(contract.company_id).await
    }

    /// Company owning the pdv, if the pdv is visible to the session.
    pub async fn find_by_pdv(
        &self,
        session: &SessionContext,
        pdv_id: Uuid,
    ) -> Result<company::Model, RepositoryError> {
        let pdv = resolve::<Pdv>(self.db, session, pdv_id, "PDV_NOT_FOUND").await?;
        self.repo().find_by_primary_key(pdv.company_id).await
    }

    pub async fn update(
        &self,
        session: &SessionContext,
        id: Uuid,
        request: UpdateCompanyRequest,
    ) -> Result<CompanyResponse, RepositoryError> {
        session.require_admin()?;
        let company = self.find_one(session, id).await?;

        if let Some(revenue_record) = &request.revenue_record {
            self.ensure_unused(
                Condition::all().add(Column::RevenueRecord.eq(revenue_record.clone())),
                Some(company.id),
                "REVENUE_RECORD_ALREADY_EXISTS",
            )
            .await?;
        }
        let email = request.email.map(|email| email.trim().to_lowercase());
        if let Some(email) = &email {
            self.ensure_unused(
                Condition::all().add(Column::Email.eq(email.clone())),
                Some(company.id),
                "EMAIL_ALREADY_EXISTS",
            )
            .await?;
        }

        let mut patch = company::ActiveModel::default();
        if let Some(name) = request.name {
            patch.name = Set(name);
        }
        if let Some(social_name) = request.social_name {
            patch.social_name = Set(social_name);
        }
        if let Some(revenue_record) = request.revenue_record {
            patch.revenue_record = Set(revenue_record);
        }
        if let Some(phone) = request.phone {
            patch.phone = Set(Some(phone));
        }
        if let Some(payment_method) = request.payment_method {
            patch.payment_method = Set(payment_method);
        }
        if let Some(email) = email {
            patch.email = Set(email);
        }
        if let Some(is_active) = request.is_active {
            patch.is_active = Set(is_active);
        }
        if let Some(main_contact) = request.main_contact {
            patch.main_contact = Set(main_contact);
        }
        if let Some(address) = request.address {
            patch.address = Set(address);
        }

        let updated = self.repo().update(session, company.id, patch).await?;
        Ok(updated.into())
    }

    pub async fn remove(&self, session: &SessionContext, id: Uuid) -> Result<(), RepositoryError> {
        session.require_admin()?;
        let company = self.find_one(session, id).await?;
        self.repo().remove(company.id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revenue_record_requires_fourteen_digits() {
        assert!(validate_revenue_record("12345678000190").is_ok());
        assert!(validate_revenue_record("1234567800019").is_err());
        assert!(validate_revenue_record("12.345.678/0001-90").is_err());
    }

    #[test]
    fn create_request_validation_reports_fields() {
        let request = CreateCompanyRequest {
            name: String::new(),
            social_name: "Acme Ltda".to_string(),
            revenue_record: "123".to_string(),
            phone: None,
            payment_method: "boleto".to_string(),
            email: "not-an-email".to_string(),
            is_active: true,
            main_contact: "Maria".to_string(),
            address: "Rua A, 1".to_string(),
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("revenue_record"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("address"));
    }
}
