//! Roles
//!
//! Named permission bitmasks. Deletion is hard; assignments cascade.

mod handlers;
pub mod queries;
mod types;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::AppState;
use crate::permissions::{require, PermissionRequirement, Permissions};

pub use types::{parse_permissions, CreateRoleRequest, Role, UpdateRoleRequest};

/// Create the roles router.
///
/// - GET /all - List roles (ReadRoles)
/// - GET /role/{id} - Get a role (ReadRoles)
/// - GET /user/{id} - Roles of a user (ReadRoles)
/// - POST /role - Create a role (CreateRoles)
/// - PUT /role/{id} - Update a role (UpdateRoles)
/// - DELETE /role/{id} - Delete a role (DeleteRoles)
pub fn router(state: &AppState) -> Router<AppState> {
    let guarded = |route, permission| require(route, state, PermissionRequirement::one(permission));

    Router::new()
        .route("/all", guarded(get(handlers::list_roles), Permissions::READ_ROLES))
        .route("/role", guarded(post(handlers::create_role), Permissions::CREATE_ROLES))
        .route("/role/{id}", guarded(get(handlers::get_role), Permissions::READ_ROLES))
        .route("/role/{id}", guarded(put(handlers::update_role), Permissions::UPDATE_ROLES))
        .route("/role/{id}", guarded(delete(handlers::delete_role), Permissions::DELETE_ROLES))
        .route("/user/{id}", guarded(get(handlers::roles_of_user), Permissions::READ_ROLES))
}
