//! Authentication Service
//!
//! Cookie-based sessions: login issues a signed token in the `auth_token`
//! cookie, [`require_auth`] validates it on every protected route.

mod cookie;
mod handlers;
pub mod jwt;
mod middleware;
mod password;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::{protected, AppState};

pub use cookie::{removal_cookie, session_cookie, AUTH_COOKIE};
pub use handlers::{LoginRequest, MessageResponse, UpdatePasswordRequest};
pub use middleware::{require_auth, AuthUser};
pub use password::{hash_password, validate_password_strength, verify_password};

/// Create authentication router.
///
/// Public routes:
/// - POST /login - Login with email/password
///
/// Protected routes (session cookie required):
/// - POST /logout - Clear the session cookie
/// - GET /authenticated - Check the session
/// - PUT /update/password - Change own password
pub fn router(state: &AppState) -> Router<AppState> {
    let session = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/authenticated", get(handlers::authenticated))
        .route("/update/password", put(handlers::update_password));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected(session, state))
}
