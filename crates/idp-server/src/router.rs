//! Router configuration.
//!
//! This module creates the main Axum router that combines all endpoints.

use axum::{
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::oauth2_handlers;
use crate::saml_handlers;
use crate::state::AppContext;
use crate::ui;

/// Creates the main application router.
pub fn create_router(ctx: AppContext) -> Router {
    let cors = cors_layer(ctx.config());

    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check));

    let saml = Router::new()
        .route("/{code}/saml/login/request", get(saml_handlers::login_request))
        .route("/{code}/saml/logout/request", get(saml_handlers::logout_request))
        .route("/{code}/saml/login/initiate", get(saml_handlers::initiate_login))
        .route("/{code}/saml/login", post(saml_handlers::submit_credentials));

    let oauth2 = Router::new()
        .route("/{code}/oauth2/authorize", get(oauth2_handlers::authorize))
        .route("/{code}/oauth2/login", post(oauth2_handlers::login))
        .route("/{code}/oauth2/confirm", post(oauth2_handlers::confirm))
        .route("/{code}/oauth2/token", post(oauth2_handlers::token))
        .route("/{code}/api/users/me", get(oauth2_handlers::userinfo));

    let pages = Router::new()
        .route("/{code}", get(ui::home))
        .route("/{code}/login", post(ui::sign_in))
        .route("/{code}/logout", get(ui::sign_out));

    Router::new()
        .merge(saml)
        .merge(oauth2)
        .merge(pages)
        .with_state(ctx)
        .merge(health)
        .route("/", get(root))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Root endpoint handler.
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "SSO Tools IdP simulator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// Server information response.
#[derive(Serialize)]
pub struct ServerInfo {
    name: String,
    version: String,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// Liveness probe.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe; the in-memory store is ready as soon as it exists.
async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
