//! HTTP-level tests against a server bound to an ephemeral port.

use anyhow::{Context, Result as AnyhowResult};
use backoffice::models::user::UserRole;
use backoffice::server::{AppState, create_app};
use reqwest::StatusCode;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

#[path = "test_utils/mod.rs"]
mod test_utils;

struct TestServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<AnyhowResult<()>>>,
}

impl TestServerHandle {
    async fn shutdown(mut self) -> AnyhowResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.join_handle.take() {
            handle.await.context("server task join failed")??;
        }
        Ok(())
    }
}

impl Drop for TestServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn spawn_test_app() -> (String, DatabaseConnection, TestServerHandle) {
    let db = test_utils::setup_test_db().await.unwrap();
    let state = AppState::new(test_utils::test_config(), db.clone()).unwrap();
    let app = create_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_url = format!("http://{}", listener.local_addr().unwrap());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .context("axum server error")
    });

    (
        server_url,
        db,
        TestServerHandle {
            shutdown_tx: Some(shutdown_tx),
            join_handle: Some(join_handle),
        },
    )
}

/// Logs in as a freshly inserted, active admin and returns the bearer token.
async fn admin_token(client: &reqwest::Client, server_url: &str, db: &DatabaseConnection) -> String {
    let admin = test_utils::insert_user(db, UserRole::Admin, None, true)
        .await
        .unwrap();
    let response = client
        .post(format!("{server_url}/api/v1/auth/login"))
        .json(&json!({ "email": admin.email, "password": test_utils::TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn public_endpoints_need_no_token() {
    let (server_url, _db, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{server_url}/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["service"], "backoffice");

    let response = client
        .get(format!("{server_url}/healthz"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{server_url}/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let document: Value = response.json().await.unwrap();
    assert!(document["components"]["securitySchemes"]["bearer_auth"].is_object());
    assert!(document["paths"]["/api/v1/contracts/{id}"].is_object());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn protected_endpoints_reject_missing_or_bad_tokens() {
    let (server_url, _db, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{server_url}/api/v1/companies"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("x-trace-id"));

    let response = client
        .get(format!("{server_url}/api/v1/companies"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_TOKEN");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let (server_url, db, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();
    let admin = test_utils::insert_user(&db, UserRole::Admin, None, true)
        .await
        .unwrap();

    let response = client
        .post(format!("{server_url}/api/v1/auth/login"))
        .json(&json!({ "email": admin.email, "password": "Wr0ng!Pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn company_lifecycle() {
    let (server_url, db, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &server_url, &db).await;

    let request = test_utils::company_request("Acme");
    let response = client
        .post(format!("{server_url}/api/v1/companies"))
        .bearer_auth(&token)
        .json(&json!({
            "name": request.name,
            "social_name": request.social_name,
            "revenue_record": request.revenue_record,
            "payment_method": request.payment_method,
            "email": request.email,
            "main_contact": request.main_contact,
            "address": request.address,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["is_active"], true);

    let response = client
        .post(format!("{server_url}/api/v1/companies/list"))
        .bearer_auth(&token)
        .json(&json!({ "name": "acm", "pagination": { "page": 1, "limit": 5 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["page_count"], 1);

    let response = client
        .patch(format!("{server_url}/api/v1/companies/{id}"))
        .bearer_auth(&token)
        .json(&json!({ "main_contact": "João" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["main_contact"], "João");

    let response = client
        .delete(format!("{server_url}/api/v1/companies/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{server_url}/api/v1/companies/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_payload_is_a_bad_request() {
    let (server_url, db, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &server_url, &db).await;

    let response = client
        .post(format!("{server_url}/api/v1/companies"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Acme",
            "social_name": "Acme LTDA",
            "revenue_record": "123",
            "payment_method": "pix",
            "email": "finance@acme.example.com",
            "main_contact": "Maria",
            "address": "Rua A, 100",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{server_url}/api/v1/companies"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn contract_update_returns_next_version() {
    let (server_url, db, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &server_url, &db).await;

    let admin = test_utils::admin_session(&db).await.unwrap();
    let company = test_utils::create_company(&db, &admin, "Acme").await.unwrap();
    let contract = test_utils::create_contract(
        &db,
        &admin,
        &company,
        backoffice::models::Provider::PagSeguro,
    )
    .await
    .unwrap();

    let response = client
        .patch(format!(
            "{server_url}/api/v1/contracts/{}",
            contract.external_id
        ))
        .bearer_auth(&token)
        .json(&json!({ "rent_value": "120.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let next: Value = response.json().await.unwrap();
    assert_eq!(next["version"], 2);
    assert_eq!(next["is_current"], true);
    assert_eq!(next["company_id"], company.external_id.to_string());
    assert_ne!(next["id"], contract.external_id.to_string());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn user_validation_is_public() {
    let (server_url, db, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();
    let pending = test_utils::insert_user(&db, UserRole::Admin, None, false)
        .await
        .unwrap();

    let response = client
        .put(format!(
            "{server_url}/api/v1/users/{}/validate",
            pending.external_id
        ))
        .json(&json!({ "code": "12345678" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["message"], "INVALID_CODE");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn myself_returns_the_token_owner() {
    let (server_url, db, handle) = spawn_test_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &server_url, &db).await;

    let response = client
        .get(format!("{server_url}/api/v1/users/myself"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["role"], "admin");
    assert!(me["company_id"].is_null());
    assert!(me.get("password").is_none());

    handle.shutdown().await.unwrap();
}
