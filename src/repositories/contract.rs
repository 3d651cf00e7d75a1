//! # Contract Repository
//!
//! Contract versioning workflow. Contracts are never edited in place: a new contract
//! for a (company, provider) pair supersedes the current one and takes the next
//! version number. The whole sequence runs in one transaction, `SERIALIZABLE` on
//! PostgreSQL, so concurrent writers for the same pair cannot both become current.

use metrics::counter;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::{ScopedRepository, active_value, company_filter};
use crate::db::serializable_isolation;
use crate::error::RepositoryError;
use crate::models::Provider;
use crate::models::contract::{self, ActiveModel, Column, Entity as Contract, Model};
use crate::session::SessionContext;

pub struct ContractRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ContractRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists `candidate` as the new current contract for its (company, provider).
    ///
    /// Every current contract of the pair, removed ones included, is marked
    /// non-current, and the candidate gets `version = highest version ever issued for
    /// the pair + 1`.
    pub async fn create_new_contract(
        &self,
        session: &SessionContext,
        mut candidate: ActiveModel,
    ) -> Result<Model, RepositoryError> {
        let company_id = match session.tenant_id() {
            Some(tenant_id) => tenant_id,
            None => active_value(&candidate.company_id)
                .ok_or_else(|| RepositoryError::invalid_input("company is required"))?,
        };
        let provider = active_value(&candidate.provider)
            .ok_or_else(|| RepositoryError::invalid_input("provider is required"))?;

        let txn = self
            .db
            .begin_with_config(serializable_isolation(self.db.get_database_backend()), None)
            .await
            .map_err(RepositoryError::database_error)?;

        let contracts = ScopedRepository::<Contract, _>::new(&txn);
        let pair = company_filter::<Contract>(company_id).add(Column::Provider.eq(provider));

        let existing = ScopedRepository::<Contract, _>::new(&txn)
            .with_deleted()
            .find_all(session, pair.clone().add(Column::IsCurrent.eq(true)))
            .await?;
        for contract in &existing {
            let patch = ActiveModel {
                is_current: Set(false),
                ..Default::default()
            };
            contracts.update(session, contract.id, patch).await?;
        }

        let version = latest_version(&txn, pair).await? + 1;

        candidate.company_id = Set(company_id);
        candidate.is_current = Set(true);
        candidate.version = Set(version);
        let created = contracts.create(session, candidate).await?;

        txn.commit().await.map_err(RepositoryError::database_error)?;

        counter!("contract_versions_created_total", "provider" => provider.as_str()).increment(1);
        info!(
            contract_id = %created.external_id,
            company_id,
            provider = %provider,
            version,
            superseded = existing.len(),
            "contract version created"
        );

        Ok(created)
    }

    /// Current contract of a (company, provider) pair within the session's scope.
    pub async fn current_contract(
        &self,
        session: &SessionContext,
        company_id: i32,
        provider: Provider,
    ) -> Result<Model, RepositoryError> {
        let filter = company_filter::<Contract>(company_id)
            .add(Column::Provider.eq(provider))
            .add(Column::IsCurrent.eq(true));

        ScopedRepository::<Contract>::new(self.db)
            .find_one(session, filter)
            .await
    }
}

/// Highest version issued for the pair, soft-deleted rows included, or 0.
async fn latest_version<C: ConnectionTrait>(
    db: &C,
    pair: Condition,
) -> Result<i32, RepositoryError> {
    let latest: Option<Option<i32>> = Contract::find()
        .select_only()
        .column_as(Column::Version.max(), "latest")
        .filter(pair)
        .into_tuple()
        .one(db)
        .await
        .map_err(RepositoryError::database_error)?;

    Ok(latest.flatten().unwrap_or(0))
}

impl From<&Model> for ActiveModel {
    /// Copies the commercial terms of a contract into a fresh candidate.
    fn from(model: &Model) -> Self {
        contract::ActiveModel {
            provider: Set(model.provider),
            rent_value: Set(model.rent_value),
            debit_tax: Set(model.debit_tax),
            pix_tax: Set(model.pix_tax),
            credit_tax: Set(model.credit_tax),
            credit_low_tax: Set(model.credit_low_tax),
            credit_high_tax: Set(model.credit_high_tax),
            payment_interval: Set(model.payment_interval),
            main_contact: Set(model.main_contact.clone()),
            company_id: Set(model.company_id),
            ..Default::default()
        }
    }
}
