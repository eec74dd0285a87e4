//! Role models and request bodies.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::ApiError;
use crate::permissions::Permissions;

/// Named permission bitmask assignable to users.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[sqlx(try_from = "i64")]
    pub permissions: Permissions,
}

/// Create role request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be between 3 and 255 characters long."))]
    pub name: String,
    /// Raw bitmask; every set bit must be a defined permission.
    pub permissions: u64,
}

/// Update role request. Every field is optional; at least one is required.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be between 3 and 255 characters long."))]
    pub name: Option<String>,
    pub permissions: Option<u64>,
}

/// Single role response.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Role,
}

/// Role listing.
#[derive(Debug, Serialize)]
pub struct RoleListResponse {
    pub roles: Vec<Role>,
    pub count: i64,
}

/// Convert a client mask, rejecting bits no permission owns.
pub fn parse_permissions(raw: u64) -> Result<Permissions, ApiError> {
    Permissions::from_raw(raw).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Permissions contain undefined bits: {:#x}",
            raw & !Permissions::all().bits()
        ))
    })
}
