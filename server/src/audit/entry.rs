//! Audit entry construction.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Kind of mutation recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_operation", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditOperation {
    Insert,
    Update,
    Delete,
}

/// Tables whose mutations are audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditTable {
    Users,
    UserRoles,
    Roles,
    Posts,
    PostContents,
    PostTags,
    Tags,
}

impl AuditTable {
    /// Table name as stored in the log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::UserRoles => "user_roles",
            Self::Roles => "roles",
            Self::Posts => "posts",
            Self::PostContents => "post_contents",
            Self::PostTags => "post_tags",
            Self::Tags => "tags",
        }
    }
}

/// Before/after snapshots of one mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditDetails {
    pub old: JsonValue,
    pub new: JsonValue,
}

/// A mutation about to be appended to the audit log.
///
/// Build through [`AuditEntry::insert`], [`AuditEntry::update`] or
/// [`AuditEntry::delete`]: inserts never carry an `old` snapshot and deletes
/// never carry a `new` one.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub table: AuditTable,
    pub row_id: i64,
    pub user_id: i64,
    pub operation: AuditOperation,
    pub details: AuditDetails,
}

impl AuditEntry {
    pub fn insert<N>(table: AuditTable, row_id: i64, user_id: i64, new: &N) -> Self
    where
        N: Serialize + Debug,
    {
        Self {
            table,
            row_id,
            user_id,
            operation: AuditOperation::Insert,
            details: AuditDetails {
                old: JsonValue::Null,
                new: snapshot(new),
            },
        }
    }

    pub fn update<O, N>(table: AuditTable, row_id: i64, user_id: i64, old: &O, new: &N) -> Self
    where
        O: Serialize + Debug,
        N: Serialize + Debug,
    {
        Self {
            table,
            row_id,
            user_id,
            operation: AuditOperation::Update,
            details: AuditDetails {
                old: snapshot(old),
                new: snapshot(new),
            },
        }
    }

    pub fn delete<O>(table: AuditTable, row_id: i64, user_id: i64, old: &O) -> Self
    where
        O: Serialize + Debug,
    {
        Self {
            table,
            row_id,
            user_id,
            operation: AuditOperation::Delete,
            details: AuditDetails {
                old: snapshot(old),
                new: JsonValue::Null,
            },
        }
    }
}

/// Serialize a value for the audit trail without ever failing.
///
/// Values serde cannot express as JSON (non-string map keys, failing custom
/// serializers) are recorded as their `Debug` rendering instead.
pub fn snapshot<T>(value: &T) -> JsonValue
where
    T: Serialize + Debug + ?Sized,
{
    serde_json::to_value(value).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Audit snapshot fell back to debug rendering");
        JsonValue::String(format!("{value:?}"))
    })
}

/// Stored audit log row.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub table_name: String,
    pub row_id: i64,
    pub user_id: i64,
    pub operation: AuditOperation,
    pub details: JsonValue,
    pub log_date: DateTime<Utc>,
}

/// Stored free-form log row.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: i64,
    pub content: String,
    pub log_date: DateTime<Utc>,
}
