//! Session Token Generation and Validation
//!
//! HS256 tokens signed with the configured secret. The payload carries the
//! user id as `sub` and the display name as `username`.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: i64,
    /// Display name at login time.
    pub username: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Sign a session token valid for `expiry_secs`.
pub fn generate_token(
    user_id: i64,
    username: &str,
    secret: &str,
    expiry_secs: i64,
) -> ApiResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now,
        exp: now + expiry_secs,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal("auth::generate_token", e))
}

/// Validate a session token and return its claims.
pub fn validate_token(token: &str, secret: &str) -> ApiResult<Claims> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        ApiError::Unauthorized("Invalid Token".into())
    })
}
