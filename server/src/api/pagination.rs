//! Page/limit query parameters.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Page sizes a client may ask for.
pub const ALLOWED_LIMITS: [i64; 5] = [5, 10, 20, 50, 100];

/// Page size used when `limit` is omitted.
pub const DEFAULT_LIMIT: i64 = 10;

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Default, Deserialize)]
struct RawPagination {
    page: Option<String>,
    limit: Option<String>,
}

impl Pagination {
    /// Parse raw `page`/`limit` strings.
    ///
    /// `page` must be an integer of at least 1 and `limit` one of
    /// [`ALLOWED_LIMITS`]. Missing values fall back to page 1 and
    /// [`DEFAULT_LIMIT`]. A page whose offset overflows `i64` is rejected.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, ApiError> {
        let page = match page {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| invalid("page must be an integer greater than 0"))?,
            None => 1,
        };

        let limit = match limit {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|l| ALLOWED_LIMITS.contains(l))
                .ok_or_else(|| invalid("limit must be one of 5, 10, 20, 50, 100"))?,
            None => DEFAULT_LIMIT,
        };

        if limit.checked_mul(page - 1).is_none() {
            return Err(invalid("page is out of range"));
        }

        Ok(Self { page, limit })
    }

    /// Rows to skip: `limit * (page - 1)`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.limit.saturating_mul(self.page - 1)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn invalid(detail: &str) -> ApiError {
    ApiError::BadRequest(format!("Invalid pagination: {detail}"))
}

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPagination>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Self::parse(raw.page.as_deref(), raw.limit.as_deref())
    }
}
