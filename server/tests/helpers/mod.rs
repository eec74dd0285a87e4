//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router,
//! plus utilities for user and role creation and session cookies.
//!
//! ## Shared Resources
//!
//! Use [`shared_pool()`] to avoid creating a new pool per test. Tests that
//! never reach the database can use [`TestApp::lazy()`] instead, which
//! builds the router over a pool that connects on first use.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, header, Method, Request, Response};
use axum::Router;
use folio_server::api::{create_router, AppState};
use folio_server::auth::{hash_password, jwt, AUTH_COOKIE};
use folio_server::config::Config;
use folio_server::db;
use folio_server::permissions::Permissions;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tower::ServiceExt;

/// Password every helper-created user logs in with.
pub const TEST_PASSWORD: &str = "Integration$Test1";

/// Boundary used by [`multipart_body`].
pub const MULTIPART_BOUNDARY: &str = "folio-test-boundary";

// ============================================================================
// Shared resources
// ============================================================================

/// Shared database pool across all tests in the same binary.
static SHARED_POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Get or create a shared, migrated database pool.
pub async fn shared_pool() -> &'static PgPool {
    SHARED_POOL
        .get_or_init(|| async {
            let config = Config::default_for_test();
            let pool = db::create_pool(&config.database_url)
                .await
                .expect("Failed to connect to test DB");
            db::run_migrations(&pool)
                .await
                .expect("Failed to migrate test DB");
            pool
        })
        .await
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a test app backed by the shared database pool.
    pub async fn new() -> Self {
        Self::build(shared_pool().await.clone(), Config::default_for_test())
    }

    /// Create a test app whose pool never connects unless a handler queries it.
    pub fn lazy() -> Self {
        Self::lazy_with_config(Config::default_for_test())
    }

    /// Like [`Self::lazy`], with a custom config.
    pub fn lazy_with_config(config: Config) -> Self {
        let pool = db::create_lazy_pool(&config.database_url).expect("Failed to build lazy pool");
        Self::build(pool, config)
    }

    fn build(pool: PgPool, config: Config) -> Self {
        let state = AppState::new(pool.clone(), config.clone());
        Self {
            router: create_router(state),
            pool,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Session cookie header value for `user_id`.
    pub fn session_cookie(&self, user_id: i64) -> String {
        let token = jwt::generate_token(user_id, "Test User", &self.config.jwt_secret, 3600)
            .expect("Failed to sign test token");
        format!("{AUTH_COOKIE}={token}")
    }

    /// Send a body-less request as `user_id`.
    pub async fn send_as(&self, user_id: i64, method: Method, uri: &str) -> Response<Body> {
        let request = Self::request(method, uri)
            .header(header::COOKIE, self.session_cookie(user_id))
            .body(Body::empty())
            .unwrap();
        self.oneshot(request).await
    }

    /// Send a JSON body as `user_id`.
    pub async fn send_json_as(
        &self,
        user_id: i64,
        method: Method,
        uri: &str,
        body: &serde_json::Value,
    ) -> Response<Body> {
        let request = Self::request(method, uri)
            .header(header::COOKIE, self.session_cookie(user_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.oneshot(request).await
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// Collect a response body as text.
pub async fn body_to_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

// ============================================================================
// Multipart
// ============================================================================

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a str,
    },
}

/// Encode `parts` as `multipart/form-data` with [`MULTIPART_BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> String {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!("--{MULTIPART_BOUNDARY}\r\n"));
        match part {
            Part::Text(name, value) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                ));
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n{data}\r\n"
                ));
            }
        }
    }
    body.push_str(&format!("--{MULTIPART_BOUNDARY}--\r\n"));
    body
}

/// Content-Type header value matching [`multipart_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
}

// ============================================================================
// User & Role helpers
// ============================================================================

static UNIQUE: AtomicU64 = AtomicU64::new(0);

/// A value unique within this test binary run.
pub fn unique_suffix() -> String {
    let n = UNIQUE.fetch_add(1, Ordering::Relaxed);
    format!("{}{n}", chrono::Utc::now().timestamp_micros())
}

/// Create an active user with [`TEST_PASSWORD`] and return `(id, email)`.
pub async fn create_test_user(pool: &PgPool) -> (i64, String) {
    let email = format!("it_{}@example.com", unique_suffix());
    let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash) VALUES ('Integration User', $1, $2) RETURNING id",
    )
    .bind(&email)
    .bind(&hash)
    .fetch_one(pool)
    .await
    .expect("Failed to create test user");
    (id, email)
}

/// Create a role holding `permissions` and return its id.
pub async fn create_role(pool: &PgPool, permissions: Permissions) -> i64 {
    sqlx::query_scalar("INSERT INTO roles (name, permissions) VALUES ($1, $2) RETURNING id")
        .bind(format!("role_{}", unique_suffix()))
        .bind(permissions.to_db())
        .fetch_one(pool)
        .await
        .expect("Failed to create role")
}

/// Assign an existing role to a user.
pub async fn grant_role(pool: &PgPool, user_id: i64, role_id: i64) {
    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(role_id)
        .execute(pool)
        .await
        .expect("Failed to grant role");
}

/// Create a user holding a fresh role with `permissions`.
pub async fn create_user_with(pool: &PgPool, permissions: Permissions) -> i64 {
    let (user_id, _) = create_test_user(pool).await;
    let role_id = create_role(pool, permissions).await;
    grant_role(pool, user_id, role_id).await;
    user_id
}

/// Set a user's lifecycle status directly.
pub async fn set_user_status(pool: &PgPool, user_id: i64, status: &str) {
    sqlx::query("UPDATE users SET status = $1::user_status WHERE id = $2")
        .bind(status)
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to set user status");
}

/// Audit entries for one row of one table, oldest first.
pub async fn audit_entries(pool: &PgPool, table: &str, row_id: i64) -> Vec<(String, serde_json::Value)> {
    sqlx::query_as::<_, (String, serde_json::Value)>(
        "SELECT operation::text, details FROM audit_logs WHERE table_name = $1 AND row_id = $2 ORDER BY id",
    )
    .bind(table)
    .bind(row_id)
    .fetch_all(pool)
    .await
    .expect("Failed to read audit log")
}
