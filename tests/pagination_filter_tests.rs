//! Paginated list endpoints and their filters.

use backoffice::error::RepositoryError;
use backoffice::models::Provider;
use backoffice::models::order::PaymentMethod;
use backoffice::repositories::PageRequest;
use backoffice::services::company::CompanyFilter;
use backoffice::services::order::{CreateOrderRequest, OrderFilter};
use backoffice::services::{CompanyService, OrderService};
use chrono::{NaiveDate, TimeZone, Utc};

#[path = "test_utils/mod.rs"]
mod test_utils;

#[tokio::test]
async fn second_page_holds_the_remainder() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    for i in 0..15 {
        test_utils::create_company(&db, &admin, &format!("Company{i}"))
            .await
            .unwrap();
    }

    let page = CompanyService::new(&db)
        .list(
            &admin,
            CompanyFilter {
                pagination: PageRequest::new(2, 10),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.data.len(), 5);
    assert_eq!(page.total, 15);
    assert_eq!(page.page, 2);
    assert_eq!(page.page_count, 2);
}

#[tokio::test]
async fn defaults_to_first_page_of_ten() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    for i in 0..12 {
        test_utils::create_company(&db, &admin, &format!("Company{i}"))
            .await
            .unwrap();
    }

    let page = CompanyService::new(&db)
        .list(&admin, CompanyFilter::default())
        .await
        .unwrap();

    assert_eq!(page.page, 1);
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.page_count, 2);
}

#[tokio::test]
async fn zero_limit_is_rejected() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();

    let result = CompanyService::new(&db)
        .list(
            &admin,
            CompanyFilter {
                pagination: PageRequest::new(1, 0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(RepositoryError::InvalidInput(_))));
}

#[tokio::test]
async fn text_filters_match_partially() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    test_utils::create_company(&db, &admin, "Northwind").await.unwrap();
    test_utils::create_company(&db, &admin, "Southwind").await.unwrap();
    test_utils::create_company(&db, &admin, "Contoso").await.unwrap();

    let page = CompanyService::new(&db)
        .list(
            &admin,
            CompanyFilter {
                name: Some("wind".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert!(page.data.iter().all(|c| c.name.contains("wind")));
}

#[tokio::test]
async fn end_date_includes_the_whole_day() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let contract = test_utils::create_contract(&db, &admin, &company, Provider::PagSeguro)
        .await
        .unwrap();
    let service = OrderService::new(&db);

    let completions = [
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 11, 0, 15, 0).unwrap(),
    ];
    for (i, completed_at) in completions.into_iter().enumerate() {
        service
            .create(
                &admin,
                CreateOrderRequest {
                    company_id: company.external_id,
                    contract_id: contract.external_id,
                    payment_method: PaymentMethod::Pix,
                    installment: None,
                    amount: 10.0 + i as f64,
                    credit_flag: None,
                    completed_at: Some(completed_at),
                },
            )
            .await
            .unwrap();
    }

    let page = service
        .list(
            &admin,
            OrderFilter {
                start_completed_at: NaiveDate::from_ymd_opt(2024, 3, 10),
                end_completed_at: NaiveDate::from_ymd_opt(2024, 3, 10),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    let mut amounts: Vec<f64> = page.data.iter().map(|o| o.amount).collect();
    amounts.sort_by(f64::total_cmp);
    assert_eq!(amounts, vec![10.0, 11.0]);
}

#[tokio::test]
async fn amount_range_is_inclusive() {
    let db = test_utils::setup_test_db().await.unwrap();
    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let contract = test_utils::create_contract(&db, &admin, &company, Provider::MgPix)
        .await
        .unwrap();
    let service = OrderService::new(&db);

    for amount in [5.0, 10.0, 20.0, 40.0] {
        service
            .create(
                &admin,
                CreateOrderRequest {
                    company_id: company.external_id,
                    contract_id: contract.external_id,
                    payment_method: PaymentMethod::Debit,
                    installment: None,
                    amount,
                    credit_flag: None,
                    completed_at: None,
                },
            )
            .await
            .unwrap();
    }

    let page = service
        .list(
            &admin,
            OrderFilter {
                start_amount: Some(10.0),
                end_amount: Some(20.0),
                provider: Some(Provider::MgPix),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total, 2);
}
