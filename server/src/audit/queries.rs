//! Audit log and free-form log queries.

use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use tracing::error;

use super::entry::{AuditEntry, AuditLog, LogRecord};
use crate::error::{ApiError, ApiResult};

/// Append an entry to the audit trail.
///
/// Accepts the pool or an open transaction. The write completes before the
/// caller builds its response; a failure is reported as an internal error
/// under `audit::record`, independent of the mutation it describes.
pub async fn record<'e, E>(executor: E, entry: &AuditEntry) -> ApiResult<AuditLog>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, AuditLog>(
        r"
        INSERT INTO audit_logs (table_name, row_id, user_id, operation, details)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, table_name, row_id, user_id, operation, details, log_date
        ",
    )
    .bind(entry.table.as_str())
    .bind(entry.row_id)
    .bind(entry.user_id)
    .bind(entry.operation)
    .bind(Json(&entry.details))
    .fetch_one(executor)
    .await
    .map_err(|e| {
        error!(
            table = entry.table.as_str(),
            row_id = entry.row_id,
            error = %e,
            "Failed to write audit log"
        );
        ApiError::internal("audit::record", e)
    })
}

/// Audit entries newest first.
pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> ApiResult<Vec<AuditLog>> {
    sqlx::query_as::<_, AuditLog>(
        r"
        SELECT id, table_name, row_id, user_id, operation, details, log_date
        FROM audit_logs
        ORDER BY log_date DESC, id DESC
        LIMIT $1 OFFSET $2
        ",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(ApiError::database("audit::list"))
}

/// Total number of audit entries.
pub async fn count(pool: &PgPool) -> ApiResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(pool)
        .await
        .map_err(ApiError::database("audit::count"))
}

/// Write a free-form diagnostic log line.
pub async fn write_log(pool: &PgPool, content: &str) -> ApiResult<LogRecord> {
    sqlx::query_as::<_, LogRecord>(
        "INSERT INTO logs (content) VALUES ($1) RETURNING id, content, log_date",
    )
    .bind(content)
    .fetch_one(pool)
    .await
    .map_err(ApiError::database("audit::write_log"))
}
