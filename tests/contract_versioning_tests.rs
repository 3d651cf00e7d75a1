//! Contract versioning: numbering, the single-current rule and concurrent writers.

use backoffice::models::Provider;
use backoffice::models::contract::{self, Column, Entity as Contract};
use backoffice::repositories::ScopedRepository;
use backoffice::services::ContractService;
use backoffice::services::contract::{ContractFilter, ContractPatch};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};

#[path = "test_utils/mod.rs"]
mod test_utils;

async fn contracts_of(
    db: &DatabaseConnection,
    company_id: i32,
    provider: Provider,
) -> Vec<contract::Model> {
    ScopedRepository::<Contract>::new(db)
        .with_deleted()
        .find_all(
            &backoffice::session::SessionContext::anonymous(),
            Condition::all()
                .add(Column::CompanyId.eq(company_id))
                .add(Column::Provider.eq(provider)),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn versions_increase_and_only_latest_is_current() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();

    for expected in 1..=3 {
        let created = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
            .await
            .unwrap();
        assert_eq!(created.version, expected);
        assert!(created.is_current);
    }

    let all = contracts_of(&db, company.id, Provider::PagSeguro).await;
    assert_eq!(all.len(), 3);
    let current: Vec<_> = all.iter().filter(|c| c.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].version, 3);
}

#[tokio::test]
async fn providers_are_versioned_independently() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();

    let first = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();
    let other = test_utils::create_contract(&db, &admin, &company, Provider::MgPix)
        .await
        .unwrap();
    let second = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();

    assert_eq!(first.version, 1);
    assert_eq!(other.version, 1);
    assert_eq!(second.version, 2);

    let service = ContractService::new(&db);
    let mgpix = service.find_one(&admin, other.external_id).await.unwrap();
    assert!(mgpix.is_current, "a new pagseguro version must not supersede mgpix");
    let superseded = service.find_one(&admin, first.external_id).await.unwrap();
    assert!(!superseded.is_current);
}

#[tokio::test]
async fn companies_are_versioned_independently() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let acme = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let globex = test_utils::create_company(&db, &admin, "Globex").await.unwrap();

    test_utils::create_contract(&db, &admin, &acme, Provider::PagSeguro)
        .await
        .unwrap();
    let globex_first = test_utils::create_contract(&db, &admin, &globex, Provider::PagSeguro)
        .await
        .unwrap();

    assert_eq!(globex_first.version, 1);
}

#[tokio::test]
async fn removed_versions_still_count_towards_numbering() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let service = ContractService::new(&db);

    let first = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();
    service.remove(&admin, first.external_id).await.unwrap();

    let next = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();
    assert_eq!(next.version, 2);
}

#[tokio::test]
async fn removed_current_version_is_superseded_by_the_next() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let service = ContractService::new(&db);

    let first = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();
    service.remove(&admin, first.external_id).await.unwrap();
    let next = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();

    let current: Vec<_> = contracts_of(&db, company.id, Provider::PagSeguro)
        .await
        .into_iter()
        .filter(|c| c.is_current)
        .collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, next.id);
}

#[tokio::test]
async fn update_issues_new_version_keeping_unpatched_terms() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let service = ContractService::new(&db);

    let original = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();
    let patch = ContractPatch {
        pix_tax: Some(Decimal::new(75, 2)),
        ..Default::default()
    };
    let next = service
        .update(&admin, original.external_id, patch)
        .await
        .unwrap();

    assert_ne!(next.external_id, original.external_id);
    assert_eq!(next.version, 2);
    assert!(next.is_current);
    assert_eq!(next.pix_tax, Decimal::new(75, 2));
    assert_eq!(next.debit_tax, original.debit_tax);
    assert_eq!(next.rent_value, original.rent_value);
    assert_eq!(next.company_id, original.company_id);

    let original = service.find_one(&admin, original.external_id).await.unwrap();
    assert!(!original.is_current);
    assert_eq!(original.pix_tax, Decimal::new(99, 2), "old version is never edited");
}

#[tokio::test]
async fn update_of_superseded_version_builds_on_current_terms() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let service = ContractService::new(&db);

    let first = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();
    let second = service
        .update(
            &admin,
            first.external_id,
            ContractPatch {
                debit_tax: Some(Decimal::new(1, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let third = service
        .update(
            &admin,
            first.external_id,
            ContractPatch {
                pix_tax: Some(Decimal::new(5, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(second.version, 2);
    assert_eq!(third.version, 3);
    assert_eq!(third.debit_tax, Decimal::new(1, 2));
    assert_eq!(third.pix_tax, Decimal::new(5, 2));
    assert_eq!(third.rent_value, first.rent_value);
}

#[tokio::test]
async fn update_after_current_was_removed_carries_target_terms() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let service = ContractService::new(&db);

    let first = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();
    let second = service
        .update(
            &admin,
            first.external_id,
            ContractPatch {
                debit_tax: Some(Decimal::new(1, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    service.remove(&admin, second.external_id).await.unwrap();

    let third = service
        .update(
            &admin,
            first.external_id,
            ContractPatch {
                pix_tax: Some(Decimal::new(5, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(third.version, 3);
    assert!(third.is_current);
    assert_eq!(third.debit_tax, first.debit_tax);
    assert_eq!(third.pix_tax, Decimal::new(5, 2));

    let current = contracts_of(&db, company.id, Provider::PagSeguro)
        .await
        .into_iter()
        .filter(|c| c.is_current)
        .count();
    assert_eq!(current, 1);
}

#[tokio::test]
async fn concurrent_creations_get_distinct_versions() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();

    let spawn = |db: DatabaseConnection| {
        let admin = admin.clone();
        let company = company.clone();
        tokio::spawn(async move {
            test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro).await
        })
    };
    let a = spawn(db.clone());
    let b = spawn(db.clone());

    let mut versions = vec![
        a.await.unwrap().unwrap().version,
        b.await.unwrap().unwrap().version,
    ];
    versions.sort();
    assert_eq!(versions, vec![1, 2]);

    let current = contracts_of(&db, company.id, Provider::PagSeguro)
        .await
        .into_iter()
        .filter(|c| c.is_current)
        .count();
    assert_eq!(current, 1);
}

#[tokio::test]
async fn non_admin_cannot_create_contracts() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let manager = test_utils::member_session(
        &db,
        backoffice::models::user::UserRole::Manager,
        &company,
    )
    .await
    .unwrap();

    let result = ContractService::new(&db)
        .create(
            &manager,
            test_utils::contract_request(company.external_id, Provider::PagSeguro),
        )
        .await;
    assert!(matches!(
        result,
        Err(backoffice::error::RepositoryError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn list_filters_current_contracts() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    for _ in 0..3 {
        test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
            .await
            .unwrap();
    }

    let page = ContractService::new(&db)
        .list(
            &admin,
            ContractFilter {
                only_current: Some(true),
                company_id: Some(company.external_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].version, 3);
    assert_eq!(page.data[0].company_id, company.external_id);
}
