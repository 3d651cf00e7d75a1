//! # Order Repository

use sea_orm::{ColumnTrait, Condition, DatabaseConnection, Set};

use super::{ScopedRepository, active_value, now};
use crate::error::RepositoryError;
use crate::models::order::{ActiveModel, Column, Entity as Order, Model};
use crate::session::SessionContext;

pub struct OrderRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OrderRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists an order, rejecting a second order on the same contract with the same
    /// amount, payment method, installment count and card flag.
    pub async fn create_new_order(
        &self,
        session: &SessionContext,
        mut candidate: ActiveModel,
    ) -> Result<Model, RepositoryError> {
        let contract_id = active_value(&candidate.contract_id)
            .ok_or_else(|| RepositoryError::invalid_input("contract is required"))?;
        let amount = active_value(&candidate.amount)
            .ok_or_else(|| RepositoryError::invalid_input("amount is required"))?;
        let payment_method = active_value(&candidate.payment_method)
            .ok_or_else(|| RepositoryError::invalid_input("payment method is required"))?;

        let duplicate = Condition::all()
            .add(Column::ContractId.eq(contract_id))
            .add(Column::Amount.eq(amount))
            .add(Column::PaymentMethod.eq(payment_method))
            .add(match active_value(&candidate.installment).flatten() {
                Some(installment) => Column::Installment.eq(installment),
                None => Column::Installment.is_null(),
            })
            .add(match active_value(&candidate.credit_flag).flatten() {
                Some(flag) => Column::CreditFlag.eq(flag),
                None => Column::CreditFlag.is_null(),
            });

        let orders = ScopedRepository::<Order>::new(self.db);
        if orders.count(session, duplicate).await? > 0 {
            return Err(RepositoryError::conflict("ORDER_ALREADY_EXISTS"));
        }

        if active_value(&candidate.completed_at).flatten().is_none() {
            candidate.completed_at = Set(Some(now()));
        }

        orders.create(session, candidate).await
    }
}
