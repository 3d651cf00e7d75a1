//! # Server Configuration
//!
//! Router assembly, shared state, OpenAPI document and the serve loop for the
//! back-office API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{Authenticator, session_middleware};
use crate::config::AppConfig;
use crate::handlers::{
    self, auth as auth_handlers, companies, contracts, orders, pdvs, resources, topics, users,
};
use crate::notifier::{LogNotifier, Notifier};
use crate::telemetry::trace_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub authenticator: Arc<Authenticator>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// State with the log-backed notifier.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Result<Self, crate::auth::AuthError> {
        let authenticator = Authenticator::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            db,
            authenticator: Arc::new(authenticator),
            notifier: Arc::new(LogNotifier),
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/api/v1/auth/login", post(auth_handlers::login))
        .route("/api/v1/users/{id}/validate", put(users::validate_user));

    let protected = Router::new()
        .route(
            "/api/v1/companies",
            get(companies::find_all_companies).post(companies::create_company),
        )
        .route("/api/v1/companies/list", post(companies::list_companies))
        .route(
            "/api/v1/companies/by-contract/{id}",
            get(companies::get_company_by_contract),
        )
        .route(
            "/api/v1/companies/by-pdv/{id}",
            get(companies::get_company_by_pdv),
        )
        .route(
            "/api/v1/companies/{id}",
            get(companies::get_company)
                .patch(companies::update_company)
                .delete(companies::remove_company),
        )
        .route(
            "/api/v1/contracts",
            get(contracts::find_all_contracts).post(contracts::create_contract),
        )
        .route("/api/v1/contracts/list", post(contracts::list_contracts))
        .route(
            "/api/v1/contracts/{id}",
            get(contracts::get_contract)
                .patch(contracts::update_contract)
                .delete(contracts::remove_contract),
        )
        .route("/api/v1/pdvs", post(pdvs::create_pdv))
        .route("/api/v1/pdvs/list", post(pdvs::list_pdvs))
        .route(
            "/api/v1/pdvs/{id}",
            get(pdvs::get_pdv)
                .patch(pdvs::update_pdv)
                .delete(pdvs::remove_pdv),
        )
        .route("/api/v1/orders", post(orders::create_order))
        .route("/api/v1/orders/list", post(orders::list_orders))
        .route(
            "/api/v1/orders/{id}",
            get(orders::get_order).delete(orders::remove_order),
        )
        .route("/api/v1/users", post(users::create_user))
        .route("/api/v1/users/list", post(users::list_users))
        .route("/api/v1/users/myself", get(users::myself))
        .route(
            "/api/v1/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::remove_user),
        )
        .route("/api/v1/topics", post(topics::create_topic))
        .route("/api/v1/topics/tree", get(topics::topic_tree))
        .route(
            "/api/v1/topics/{id}",
            get(topics::get_topic)
                .patch(topics::update_topic)
                .delete(topics::remove_topic),
        )
        .route(
            "/api/v1/topics/{id}/sub-topics",
            post(topics::create_sub_topic),
        )
        .route(
            "/api/v1/resources",
            get(resources::list_resources).post(resources::create_resource),
        )
        .route(
            "/api/v1/resources/{id}",
            get(resources::get_resource)
                .patch(resources::update_resource)
                .delete(resources::remove_resource),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    let cors = cors_layer(&state.config);

    public
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_middleware))
}

/// Any origin when none are configured, otherwise exactly the configured list.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr().context("invalid server address")?;
    let profile = config.profile.clone();
    let state = AppState::new(config, db).context("initializing authenticator")?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, %profile, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => tracing::error!(%error, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::auth::login,
        crate::handlers::companies::create_company,
        crate::handlers::companies::list_companies,
        crate::handlers::companies::find_all_companies,
        crate::handlers::companies::get_company,
        crate::handlers::companies::get_company_by_contract,
        crate::handlers::companies::get_company_by_pdv,
        crate::handlers::companies::update_company,
        crate::handlers::companies::remove_company,
        crate::handlers::contracts::create_contract,
        crate::handlers::contracts::list_contracts,
        crate::handlers::contracts::find_all_contracts,
        crate::handlers::contracts::get_contract,
        crate::handlers::contracts::update_contract,
        crate::handlers::contracts::remove_contract,
        crate::handlers::pdvs::create_pdv,
        crate::handlers::pdvs::list_pdvs,
        crate::handlers::pdvs::get_pdv,
        crate::handlers::pdvs::update_pdv,
        crate::handlers::pdvs::remove_pdv,
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::remove_order,
        crate::handlers::users::create_user,
        crate::handlers::users::validate_user,
        crate::handlers::users::myself,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::remove_user,
        crate::handlers::topics::create_topic,
        crate::handlers::topics::create_sub_topic,
        crate::handlers::topics::topic_tree,
        crate::handlers::topics::get_topic,
        crate::handlers::topics::update_topic,
        crate::handlers::topics::remove_topic,
        crate::handlers::resources::create_resource,
        crate::handlers::resources::list_resources,
        crate::handlers::resources::get_resource,
        crate::handlers::resources::update_resource,
        crate::handlers::resources::remove_resource,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::error::ApiError,
            crate::repositories::PageRequest,
            crate::models::provider::Provider,
            crate::models::contract::PaymentInterval,
            crate::models::order::PaymentMethod,
            crate::models::order::CreditFlag,
            crate::models::pdv::PdvStatus,
            crate::models::resource::ResourceType,
            crate::models::user::UserRole,
            crate::services::auth::LoginRequest,
            crate::services::auth::LoginResponse,
            crate::services::company::CreateCompanyRequest,
            crate::services::company::UpdateCompanyRequest,
            crate::services::company::CompanyFilter,
            crate::services::company::CompanyResponse,
            crate::services::contract::CreateContractRequest,
            crate::services::contract::ContractPatch,
            crate::services::contract::ContractFilter,
            crate::services::contract::ContractResponse,
            crate::services::pdv::CreatePdvRequest,
            crate::services::pdv::UpdatePdvRequest,
            crate::services::pdv::PdvFilter,
            crate::services::pdv::PdvResponse,
            crate::services::order::CreateOrderRequest,
            crate::services::order::OrderFilter,
            crate::services::order::OrderResponse,
            crate::services::user::CreateUserRequest,
            crate::services::user::UpdateUserRequest,
            crate::services::user::ValidateCodeRequest,
            crate::services::user::UserFilter,
            crate::services::user::UserResponse,
            crate::services::topic::CreateTopicRequest,
            crate::services::topic::UpdateTopicRequest,
            crate::services::topic::TopicResponse,
            crate::services::topic::TopicTreeNode,
            crate::services::resource::CreateResourceRequest,
            crate::services::resource::UpdateResourceRequest,
            crate::services::resource::ResourceResponse,
        )
    ),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "auth", description = "Login"),
        (name = "companies", description = "Client companies"),
        (name = "contracts", description = "Versioned provider contracts"),
        (name = "pdvs", description = "Points of sale"),
        (name = "orders", description = "Payment orders"),
        (name = "users", description = "Back-office users"),
        (name = "topics", description = "Knowledge-base topics"),
        (name = "resources", description = "Knowledge-base resources")
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Backoffice API",
        description = "Multi-tenant back-office for companies, contracts, points of sale and payment orders",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
