//! User models and request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::auth::validate_password_strength;
use crate::roles::Role;

/// Account lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Deleted,
}

/// User row.
///
/// The password hash is never serialized and never appears in `Debug`
/// output, so neither responses nor audit snapshots can leak it.
#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("last_update", &self.last_update)
            .finish_non_exhaustive()
    }
}

/// Create user request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be between 3 and 255 characters long."))]
    pub name: String,
    #[validate(email(message = "Email must be a valid email address."))]
    pub email: String,
    #[validate(
        length(min = 12, max = 100, message = "Password must be between 12 and 100 characters long."),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
}

/// Update user request. Every field is optional; at least one is required.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be between 3 and 255 characters long."))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid email address."))]
    pub email: Option<String>,
    pub status: Option<UserStatus>,
}

/// Replace a user's role assignments.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolesRequest {
    #[validate(length(max = 64, message = "Too many roles."))]
    pub role_ids: Vec<i64>,
}

/// Single user response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// User listing.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub count: i64,
}

/// Roles held by a user.
#[derive(Debug, Serialize)]
pub struct UserRolesResponse {
    pub roles: Vec<Role>,
}

/// Role-assignment snapshot for the audit log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub user_id: i64,
    pub role_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            email: "ada@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            name: "Ada".into(),
            status: UserStatus::Active,
            created_at: Utc::now(),
            last_update: Utc::now(),
        }
    }

    #[test]
    fn test_user_json_never_contains_password() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["status"], "active");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_user_debug_never_contains_password() {
        let rendered = format!("{:?}", sample_user());
        assert!(!rendered.contains("argon2"));
        assert!(rendered.contains("ada@example.com"));
    }

    #[test]
    fn test_create_user_request_validation() {
        let valid = CreateUserRequest {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            password: "Analytical$Engine1".into(),
        };
        assert!(valid.validate().is_ok());

        let unlisted_special = CreateUserRequest {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            password: "Analytical#Engine1".into(),
        };
        assert!(unlisted_special.validate().is_err());

        let weak = CreateUserRequest {
            password: "alllowercase123!".into(),
            ..valid
        };
        assert!(weak.validate().is_err());
    }

    #[test]
    fn test_create_user_request_rejects_bad_email_and_short_name() {
        let req = CreateUserRequest {
            name: "Al".into(),
            email: "not-an-email".into(),
            password: "Analytical$Engine1".into(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_update_user_request_fields_optional() {
        let req: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_ok());
        assert!(req.name.is_none() && req.email.is_none() && req.status.is_none());
    }

    #[test]
    fn test_status_parses_lowercase() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"status":"inactive"}"#).unwrap();
        assert_eq!(req.status, Some(UserStatus::Inactive));
    }
}
