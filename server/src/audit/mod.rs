//! Audit Trail
//!
//! Append-only before/after snapshots of every mutation, plus a free-form
//! diagnostic log used for unexpected failures.

mod entry;
mod handlers;
pub mod queries;

use axum::{routing::get, Router};

use crate::api::AppState;
use crate::permissions::{require, Permissions, PermissionRequirement};

pub use entry::{
    snapshot, AuditDetails, AuditEntry, AuditLog, AuditOperation, AuditTable, LogRecord,
};
pub use queries::{record, write_log};

/// Create the log router.
///
/// - GET /audit - List audit entries (ReadUsers and ReadRoles)
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/audit",
        require(
            get(handlers::list_audit_logs),
            state,
            PermissionRequirement::all([Permissions::READ_USERS, Permissions::READ_ROLES]),
        ),
    )
}
