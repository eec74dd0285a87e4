//! Users
//!
//! Accounts, soft deletion and role assignment.

pub mod bootstrap;
mod handlers;
pub mod queries;
mod types;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::AppState;
use crate::permissions::{require, PermissionRequirement, Permissions};

pub use types::{
    AssignRolesRequest, CreateUserRequest, RoleAssignment, UpdateUserRequest, User, UserStatus,
};

/// Create the users router.
///
/// - GET /all - List users (ReadUsers)
/// - GET /userinfo/{id} - Get a user (ReadUsers)
/// - GET /info/me - Own account
/// - POST /create - Create a user (CreateUsers)
/// - PUT /user/{id} - Update a user (UpdateUsers)
/// - PUT /update/self - Update own account
/// - DELETE /user/{id} - Soft-delete a user (DeleteUsers)
/// - GET /user/{id}/roles - Roles of a user (ReadUsers)
/// - PUT /user/{id}/roles - Replace role assignments (UpdateUsers and UpdateRoles)
pub fn router(state: &AppState) -> Router<AppState> {
    let guarded = |route, permission| require(route, state, PermissionRequirement::one(permission));

    Router::new()
        .route("/all", guarded(get(handlers::list_users), Permissions::READ_USERS))
        .route("/userinfo/{id}", guarded(get(handlers::get_user), Permissions::READ_USERS))
        .route("/info/me", get(handlers::get_me))
        .route("/create", guarded(post(handlers::create_user), Permissions::CREATE_USERS))
        .route("/user/{id}", guarded(put(handlers::update_user), Permissions::UPDATE_USERS))
        .route("/user/{id}", guarded(delete(handlers::delete_user), Permissions::DELETE_USERS))
        .route("/update/self", put(handlers::update_self))
        .route(
            "/user/{id}/roles",
            guarded(get(handlers::get_user_roles), Permissions::READ_USERS),
        )
        .route(
            "/user/{id}/roles",
            require(
                put(handlers::assign_roles),
                state,
                PermissionRequirement::all([Permissions::UPDATE_USERS, Permissions::UPDATE_ROLES]),
            ),
        )
}
