//! # Tests for Handlers
//!
//! Handler-level unit tests plus router tests driven through `tower::ServiceExt`.

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{Request, StatusCode, header::AUTHORIZATION},
    response::Json,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::Authenticator;
use crate::config::AppConfig;
use crate::handlers::{healthz, root};
use crate::models::user::{self, UserRole};
use crate::notifier::LogNotifier;
use crate::repositories::UserRepository;
use crate::server::{AppState, create_app};
use crate::session::SessionContext;

const SECRET: &str = "handler-tests-secret-0123456789abcdef";

fn state_with(db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(AppConfig {
            profile: "test".to_string(),
            jwt_secret: Some(SECRET.to_string()),
            password_hash_cost: 4,
            ..Default::default()
        }),
        db,
        authenticator: Arc::new(Authenticator::new(SECRET, 300)),
        notifier: Arc::new(LogNotifier),
    }
}

async fn migrated_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

async fn insert_admin(db: &DatabaseConnection) -> user::Model {
    let candidate = user::ActiveModel {
        name: Set("Root".to_string()),
        surname: Set("Admin".to_string()),
        full_name: Set("Root Admin".to_string()),
        phone: Set(None),
        identifier: Set("00000000191".to_string()),
        role: Set(UserRole::Admin),
        email: Set("root@example.com".to_string()),
        password: Set(bcrypt::hash("Str0ng!Pass", 4).unwrap()),
        is_active: Set(true),
        verification_code: Set(None),
        code_created_at: Set(None),
        company_id: Set(None),
        ..Default::default()
    };
    UserRepository::new(db)
        .create_new_user(&SessionContext::anonymous(), candidate)
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_handler_returns_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "backoffice");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_healthz_reports_database() {
    let state = state_with(migrated_db().await);

    let Json(status) = healthz(State(state)).await.unwrap();
    assert_eq!(status.status, "ok");
    assert_eq!(status.database, "ok");
}

#[tokio::test]
async fn test_healthz_fails_without_database() {
    let state = state_with(DatabaseConnection::default());

    let error = healthz(State(state)).await.unwrap_err();
    assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = create_app(state_with(migrated_db().await));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/myself")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_route_rejects_foreign_token() {
    let db = migrated_db().await;
    let admin = insert_admin(&db).await;
    let app = create_app(state_with(db));

    let forged = Authenticator::new("some-other-secret-0123456789abcdef", 300)
        .issue(admin.external_id, None, UserRole::Admin)
        .unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/myself")
                .header(AUTHORIZATION, format!("Bearer {forged}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_protected_route_accepts_valid_token() {
    let db = migrated_db().await;
    let admin = insert_admin(&db).await;
    let state = state_with(db);
    let token = state
        .authenticator
        .issue(admin.external_id, None, UserRole::Admin)
        .unwrap();
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/myself")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-trace-id"], "req-42");
    let body = body_json(response).await;
    assert_eq!(body["id"], admin.external_id.to_string());
    assert_eq!(body["email"], "root@example.com");
}
