//! Authentication HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::cookie::{removal_cookie, session_cookie};
use super::jwt::generate_token;
use super::middleware::AuthUser;
use super::password::{hash_password, validate_password_strength, verify_password};
use crate::api::AppState;
use crate::audit::{self, AuditEntry, AuditTable};
use crate::error::{ApiError, ApiResult};
use crate::users;

/// Literal recorded in place of password snapshots.
const PASSWORD_MARKER: &str = "password";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, max = 100, message = "Password must be between 8 and 100 characters long."))]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Previous password is required."))]
    pub prev_password: String,
    #[validate(
        length(min = 12, max = 100, message = "New password must be between 12 and 100 characters long."),
        custom(function = "validate_password_strength")
    )]
    pub new_password: String,
}

/// Plain message response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Login with email and password; sets the `auth_token` cookie.
/// POST /auth/login
#[tracing::instrument(skip(state, jar, body))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let invalid = || ApiError::Unauthorized("Invalid Credentials".into());

    let user = users::queries::find_by_email(&state.db, &body.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::info!(user_id = user.id, "Login rejected");
        return Err(invalid());
    }

    let token = generate_token(
        user.id,
        &user.name,
        &state.config.jwt_secret,
        state.config.jwt_expiry,
    )?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        jar.add(session_cookie(token, &state.config)),
        MessageResponse::new("Login successful"),
    ))
}

/// Clear the session cookie.
/// POST /auth/logout
#[tracing::instrument(skip(jar))]
pub async fn logout(auth_user: AuthUser, jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    tracing::info!(user_id = auth_user.id, "User logged out");
    (
        jar.remove(removal_cookie()),
        MessageResponse::new("Logout successful"),
    )
}

/// Confirm the session is valid.
/// GET /auth/authenticated
#[tracing::instrument]
pub async fn authenticated(_auth_user: AuthUser) -> Json<MessageResponse> {
    MessageResponse::new("Authenticated")
}

/// Change the caller's password.
/// PUT /auth/update/password
#[tracing::instrument(skip(state, body), fields(user_id = auth_user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<UpdatePasswordRequest>,
) -> ApiResult<StatusCode> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user = users::queries::find_one(&state.db, auth_user.id).await?;

    if !verify_password(&body.prev_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid previous password".into()));
    }

    let new_hash = hash_password(&body.new_password)?;
    users::queries::update_password(&state.db, user.id, &new_hash).await?;

    audit::record(
        &state.db,
        &AuditEntry::update(
            AuditTable::Users,
            user.id,
            auth_user.id,
            &PASSWORD_MARKER,
            &PASSWORD_MARKER,
        ),
    )
    .await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
