//! Audit log HTTP handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use super::entry::AuditLog;
use super::queries;
use crate::api::{AppState, Pagination};
use crate::error::ApiResult;

/// Paginated audit log listing.
#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub logs: Vec<AuditLog>,
    pub count: i64,
    pub page: i64,
    pub limit: i64,
}

/// List audit entries, newest first.
/// GET /api/logs/audit
#[tracing::instrument(skip(state))]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<Json<AuditLogPage>> {
    let logs = queries::list(&state.db, pagination.limit, pagination.offset()).await?;
    let count = queries::count(&state.db).await?;

    Ok(Json(AuditLogPage {
        logs,
        count,
        page: pagination.page,
        limit: pagination.limit,
    }))
}
