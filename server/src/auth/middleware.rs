//! Authentication Middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use super::cookie::AUTH_COOKIE;
use super::jwt::validate_token;
use crate::api::AppState;
use crate::error::ApiError;

/// Authenticated caller injected into request extensions.
///
/// Carries the token payload only. Account status and roles are loaded by the
/// permission guard on routes that declare a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User id (`sub`).
    pub id: i64,
    /// Display name at login time.
    pub username: String,
}

/// Middleware to require a valid `auth_token` cookie.
///
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_auth))
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(request.headers());
    let token = jar
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".into()))?;

    let claims = validate_token(&token, &state.config.jwt_secret)?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        username: claims.username,
    });

    Ok(next.run(request).await)
}

/// Extractor for the authenticated caller in handlers.
///
/// ```ignore
/// async fn whoami(auth_user: AuthUser) -> String {
///     auth_user.username
/// }
/// ```
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".into()))
    }
}
