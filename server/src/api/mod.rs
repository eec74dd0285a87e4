//! API Router and Application State
//!
//! Central routing configuration and shared state.

mod envelope;
mod extract;
mod ip_filter;
mod pagination;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Uri},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{audit, auth, config::Config, error::ApiError, posts, roles, tags, users};

pub use envelope::{error_envelope, ErrorEnvelope};
pub use extract::{parse_id, ResourceId};
pub use ip_filter::{ip_allow_list, is_allowed};
pub use pagination::{Pagination, ALLOWED_LIMITS, DEFAULT_LIMIT};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Require a session cookie and an allowed peer IP on every route of `router`.
pub fn protected(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router
        .layer(from_fn_with_state(state.clone(), auth::require_auth))
        .layer(from_fn_with_state(state.clone(), ip_allow_list))
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let max_upload_size = state.config.max_upload_size;

    let api_routes = Router::new()
        .nest("/api/users", users::router(&state))
        .nest("/api/roles", roles::router(&state))
        .nest("/api/tags", tags::router(&state))
        .nest("/api/logs", audit::router(&state));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth routes; login is public, the rest protect themselves
        .nest("/auth", auth::router(&state))
        // Posts mix public reads with protected writes
        .nest("/api/posts", posts::router(&state))
        .merge(protected(api_routes, &state))
        .fallback(route_not_found)
        // Middleware
        .layer(from_fn_with_state(state.clone(), error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.config.cors_origin.as_deref()))
        .layer(DefaultBodyLimit::max(max_upload_size))
        // State
        .with_state(state)
}

/// CORS for the configured front-end origin. Cookies require credentials,
/// which rules out wildcard origins.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin.and_then(|o| HeaderValue::from_str(o).ok()) else {
        return CorsLayer::new();
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Cannot {method} {}", uri.path()))
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
