//! `auth_token` cookie construction.

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::Config;

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "auth_token";

/// Session cookie: http-only, same-site strict, secure in production.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.secure_cookies)
        .max_age(time::Duration::seconds(config.auth_cookie_max_age))
        .path("/")
        .build()
}

/// Cookie used to clear the session; the path must match [`session_cookie`].
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE).path("/").build()
}
