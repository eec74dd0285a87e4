//! Post search filters and ordering.
//!
//! Query-string keys: `status`, `startDate`, `endDate`, `query`, `by`,
//! `order`. Only active and inactive posts can be searched; the date window
//! is `[startDate, endDate + 1 day)` and defaults to `[1900-01-01,
//! 2100-01-01)`.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use super::types::PostStatus;
use crate::error::{ApiError, ApiResult};

/// Column a search is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrderBy {
    #[default]
    Date,
    Title,
    Popularity,
}

impl PostOrderBy {
    const fn column(self) -> &'static str {
        match self {
            Self::Date => "p.created_at",
            Self::Title => "p.title",
            Self::Popularity => "p.views",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Raw query-string parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub query: Option<String>,
    pub by: Option<String>,
    pub order: Option<String>,
}

/// Validated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSearch {
    pub status: PostStatus,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub query: Option<String>,
    pub order_by: PostOrderBy,
    pub direction: SortDirection,
}

impl PostSearch {
    pub fn parse(params: SearchParams) -> ApiResult<Self> {
        let status = match non_empty(params.status.as_deref()) {
            None => PostStatus::Active,
            Some(raw) if raw.eq_ignore_ascii_case("active") => PostStatus::Active,
            Some(raw) if raw.eq_ignore_ascii_case("inactive") => PostStatus::Inactive,
            Some(_) => {
                return Err(ApiError::BadRequest(
                    "Status must be one of the following values: active, inactive".into(),
                ))
            }
        };

        let start = match non_empty(params.start_date.as_deref()) {
            Some(raw) => parse_date(raw, "Start date")?,
            None => year_start(1900),
        };

        let end = match non_empty(params.end_date.as_deref()) {
            Some(raw) => parse_date(raw, "End date")?
                .checked_add_signed(TimeDelta::days(1))
                .ok_or_else(|| invalid_date("End date"))?,
            None => year_start(2100),
        };

        let order_by = match non_empty(params.by.as_deref()) {
            None => PostOrderBy::default(),
            Some(raw) if raw.eq_ignore_ascii_case("date") => PostOrderBy::Date,
            Some(raw) if raw.eq_ignore_ascii_case("title") => PostOrderBy::Title,
            Some(raw) if raw.eq_ignore_ascii_case("popularity") => PostOrderBy::Popularity,
            Some(_) => {
                return Err(ApiError::BadRequest(
                    "Order by must be one of: date, title, popularity".into(),
                ))
            }
        };

        let direction = match non_empty(params.order.as_deref()) {
            None => SortDirection::default(),
            Some(raw) if raw.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(raw) if raw.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(_) => {
                return Err(ApiError::BadRequest(
                    "Order direction must be either \"ASC\" or \"DESC\".".into(),
                ))
            }
        };

        Ok(Self {
            status,
            start,
            end,
            query: non_empty(params.query.as_deref()).map(str::to_string),
            order_by,
            direction,
        })
    }

    /// Append the `WHERE` clause. Expects the post table aliased `p` and its
    /// `main` content block aliased `c`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE p.status = ")
            .push_bind(self.status)
            .push(" AND p.created_at >= ")
            .push_bind(self.start)
            .push(" AND p.created_at < ")
            .push_bind(self.end);

        if let Some(query) = &self.query {
            let pattern = format!("%{}%", escape_like(query));
            qb.push(" AND (p.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.content ILIKE ")
                .push_bind(pattern)
                .push(" OR ")
                .push_bind(query.clone())
                .push(" = ANY(p.keywords))");
        }
    }

    /// `ORDER BY` clause with `id` as tie-breaker.
    #[must_use]
    pub fn order_clause(&self) -> String {
        let direction = self.direction.as_sql();
        format!(
            " ORDER BY {} {direction}, p.id {direction}",
            self.order_by.column()
        )
    }
}

impl<S> FromRequestParts<S> for PostSearch
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<SearchParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Self::parse(params)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// RFC 3339 timestamp or plain `YYYY-MM-DD` (midnight UTC).
fn parse_date(raw: &str, field: &str) -> ApiResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
        .ok_or_else(|| invalid_date(field))
}

fn invalid_date(field: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "{field} must be a valid date string (ISO 8601 format)."
    ))
}

fn year_start(year: i32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
        .unwrap_or_default()
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SearchParams {
        SearchParams::default()
    }

    #[test]
    fn test_defaults() {
        let search = PostSearch::parse(params()).unwrap();
        assert_eq!(search.status, PostStatus::Active);
        assert_eq!(search.start.to_rfc3339(), "1900-01-01T00:00:00+00:00");
        assert_eq!(search.end.to_rfc3339(), "2100-01-01T00:00:00+00:00");
        assert_eq!(search.order_by, PostOrderBy::Date);
        assert_eq!(search.direction, SortDirection::Desc);
        assert!(search.query.is_none());
    }

    #[test]
    fn test_end_date_is_exclusive_next_day() {
        let search = PostSearch::parse(SearchParams {
            start_date: Some("2024-03-01".into()),
            end_date: Some("2024-03-31".into()),
            ..params()
        })
        .unwrap();
        assert_eq!(search.start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(search.end.to_rfc3339(), "2024-04-01T00:00:00+00:00");
    }

    #[test]
    fn test_accepts_rfc3339_dates() {
        let search = PostSearch::parse(SearchParams {
            start_date: Some("2024-03-01T10:00:00+02:00".into()),
            ..params()
        })
        .unwrap();
        assert_eq!(search.start.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn test_rejects_bad_dates() {
        let err = PostSearch::parse(SearchParams {
            start_date: Some("yesterday".into()),
            ..params()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.starts_with("Start date")));
    }

    #[test]
    fn test_deleted_status_is_not_searchable() {
        let err = PostSearch::parse(SearchParams {
            status: Some("deleted".into()),
            ..params()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let inactive = PostSearch::parse(SearchParams {
            status: Some("inactive".into()),
            ..params()
        })
        .unwrap();
        assert_eq!(inactive.status, PostStatus::Inactive);
    }

    #[test]
    fn test_ordering_options() {
        let search = PostSearch::parse(SearchParams {
            by: Some("popularity".into()),
            order: Some("ASC".into()),
            ..params()
        })
        .unwrap();
        assert_eq!(search.order_clause(), " ORDER BY p.views ASC, p.id ASC");

        assert!(PostSearch::parse(SearchParams {
            by: Some("author".into()),
            ..params()
        })
        .is_err());
        assert!(PostSearch::parse(SearchParams {
            order: Some("sideways".into()),
            ..params()
        })
        .is_err());
    }

    #[test]
    fn test_where_clause_without_query() {
        let search = PostSearch::parse(params()).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM posts p");
        search.push_where(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM posts p WHERE p.status = $1 AND p.created_at >= $2 AND p.created_at < $3"
        );
    }

    #[test]
    fn test_where_clause_with_query_matches_title_content_and_keywords() {
        let search = PostSearch::parse(SearchParams {
            query: Some("rust".into()),
            ..params()
        })
        .unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM posts p");
        search.push_where(&mut qb);
        assert!(qb.sql().ends_with(
            " AND (p.title ILIKE $4 OR c.content ILIKE $5 OR $6 = ANY(p.keywords))"
        ));
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }
}
