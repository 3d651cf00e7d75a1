//! Test utilities for database testing.
//!
//! In-memory SQLite databases with migrations applied, plus fixtures for companies,
//! contracts and users created through the same services the API uses.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use backoffice::config::AppConfig;
use backoffice::models::{Provider, company, contract, user, user::UserRole};
use backoffice::models::contract::PaymentInterval;
use backoffice::repositories::UserRepository;
use backoffice::services::company::CreateCompanyRequest;
use backoffice::services::contract::CreateContractRequest;
use backoffice::services::{CompanyService, ContractService};
use backoffice::session::{SessionCompany, SessionContext, SessionUser};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection, Set};
use uuid::Uuid;

/// Clear-text password of every fixture user.
pub const TEST_PASSWORD: &str = "Str0ng!Pass";

pub const TEST_JWT_SECRET: &str = "test-secret-0123456789abcdef-0123456789";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Test profile with a JWT secret and the cheapest bcrypt cost.
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        jwt_secret: Some(TEST_JWT_SECRET.to_string()),
        password_hash_cost: 4,
        ..Default::default()
    }
}

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 14 digits derived from a fresh uuid.
pub fn revenue_record() -> String {
    format!("{:014}", Uuid::new_v4().as_u128() % 100_000_000_000_000)
}

pub fn company_request(name: &str) -> CreateCompanyRequest {
    CreateCompanyRequest {
        name: name.to_string(),
        social_name: format!("{name} LTDA"),
        revenue_record: revenue_record(),
        phone: None,
        payment_method: "pix".to_string(),
        email: format!("{}@{}.example.com", unique_suffix(), name.to_lowercase()),
        is_active: true,
        main_contact: "Maria".to_string(),
        address: "Rua A, 100".to_string(),
    }
}

pub fn contract_request(company_id: Uuid, provider: Provider) -> CreateContractRequest {
    CreateContractRequest {
        company_id,
        provider,
        rent_value: Decimal::new(9990, 2),
        debit_tax: Decimal::new(150, 2),
        pix_tax: Decimal::new(99, 2),
        credit_tax: Decimal::new(299, 2),
        credit_low_tax: Decimal::new(349, 2),
        credit_high_tax: Decimal::new(499, 2),
        payment_interval: PaymentInterval::Monthly,
        main_contact: Some("Maria".to_string()),
    }
}

/// Inserts a user directly, bypassing role checks and the verification flow.
pub async fn insert_user(
    db: &DatabaseConnection,
    role: UserRole,
    company: Option<&company::Model>,
    active: bool,
) -> Result<user::Model> {
    let suffix = unique_suffix();
    let hash = bcrypt::hash(TEST_PASSWORD, 4)?;
    let candidate = user::ActiveModel {
        name: Set("Test".to_string()),
        surname: Set("User".to_string()),
        full_name: Set("Test User".to_string()),
        phone: Set(None),
        identifier: Set(suffix[..11].to_string()),
        role: Set(role),
        email: Set(format!("{suffix}@users.example.com")),
        password: Set(hash),
        is_active: Set(active),
        verification_code: Set(None),
        code_created_at: Set(None),
        company_id: Set(company.map(|c| c.id)),
        ..Default::default()
    };

    UserRepository::new(db)
        .create_new_user(&SessionContext::anonymous(), candidate)
        .await
        .map_err(|e| anyhow!("inserting user: {e}"))
}

pub fn session_for(user: &user::Model, company: Option<&company::Model>) -> SessionContext {
    SessionContext::authenticated(SessionUser::from(user), company.map(SessionCompany::from))
        .expect("fixture session is valid")
}

pub async fn admin_session(db: &DatabaseConnection) -> Result<SessionContext> {
    let admin = insert_user(db, UserRole::Admin, None, true).await?;
    Ok(session_for(&admin, None))
}

pub async fn member_session(
    db: &DatabaseConnection,
    role: UserRole,
    company: &company::Model,
) -> Result<SessionContext> {
    let member = insert_user(db, role, Some(company), true).await?;
    Ok(session_for(&member, Some(company)))
}

pub async fn create_company(
    db: &DatabaseConnection,
    admin: &SessionContext,
    name: &str,
) -> Result<company::Model> {
    let service = CompanyService::new(db);
    let created = service
        .create(admin, company_request(name))
        .await
        .map_err(|e| anyhow!("creating company: {e}"))?;
    service
        .find_one(admin, created.id)
        .await
        .map_err(|e| anyhow!("loading company: {e}"))
}

pub async fn create_contract(
    db: &DatabaseConnection,
    admin: &SessionContext,
    company: &company::Model,
    provider: Provider,
) -> Result<contract::Model> {
    ContractService::new(db)
        .create(admin, contract_request(company.external_id, provider))
        .await
        .map_err(|e| anyhow!("creating contract: {e}"))
}
