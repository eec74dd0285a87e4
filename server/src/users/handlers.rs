//! User HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use super::queries;
use super::types::{
    AssignRolesRequest, CreateUserRequest, RoleAssignment, UpdateUserRequest, UserListResponse,
    UserResponse, UserRolesResponse,
};
use crate::api::{AppState, Pagination, ResourceId};
use crate::audit::{self, AuditEntry, AuditTable};
use crate::auth::{hash_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::roles;

/// List users.
/// GET /api/users/all
#[tracing::instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<Json<UserListResponse>> {
    let users = queries::list(&state.db, pagination.limit, pagination.offset()).await?;
    let count = queries::count(&state.db).await?;
    Ok(Json(UserListResponse { users, count }))
}

/// Get one user.
/// GET /api/users/userinfo/{id}
#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<UserResponse>> {
    let user = queries::find_one(&state.db, id).await?;
    Ok(Json(UserResponse { user }))
}

/// Get the caller's own account.
/// GET /api/users/info/me
#[tracing::instrument(skip(state), fields(user_id = auth_user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = queries::find_one(&state.db, auth_user.id).await?;
    Ok(Json(UserResponse { user }))
}

/// Create a user.
/// POST /api/users/create
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let email = body.email.trim().to_lowercase();
    if queries::email_taken(&state.db, &email).await? {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&body.password)?;
    let user = queries::create(&state.db, body.name.trim(), &email, &password_hash).await?;

    audit::record(
        &state.db,
        &AuditEntry::insert(AuditTable::Users, user.id, auth_user.id, &user),
    )
    .await?;

    tracing::info!(user_id = user.id, "User created");
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Update another user.
/// PUT /api/users/user/{id}
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<StatusCode> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    apply_update(&state, auth_user.id, id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Update the caller's own account. `status` is ignored.
/// PUT /api/users/update/self
#[tracing::instrument(skip(state, body), fields(user_id = auth_user.id))]
pub async fn update_self(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(mut body): Json<UpdateUserRequest>,
) -> ApiResult<StatusCode> {
    body.status = None;
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    apply_update(&state, auth_user.id, auth_user.id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(
    state: &AppState,
    actor: i64,
    id: i64,
    body: UpdateUserRequest,
) -> ApiResult<()> {
    let old = queries::find_one(&state.db, id).await?;
    let new = queries::update(
        &state.db,
        id,
        body.name.map(|n| n.trim().to_string()),
        body.email.map(|e| e.trim().to_lowercase()),
        body.status,
    )
    .await?;

    audit::record(
        &state.db,
        &AuditEntry::update(AuditTable::Users, id, actor, &old, &new),
    )
    .await?;
    Ok(())
}

/// Soft-delete a user.
/// DELETE /api/users/user/{id}
#[tracing::instrument(skip(state), fields(actor = auth_user.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    let before = queries::soft_delete(&state.db, id).await?;

    audit::record(
        &state.db,
        &AuditEntry::delete(AuditTable::Users, id, auth_user.id, &before),
    )
    .await?;

    tracing::info!(user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Roles held by a user.
/// GET /api/users/user/{id}/roles
#[tracing::instrument(skip(state))]
pub async fn get_user_roles(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<UserRolesResponse>> {
    queries::find_one(&state.db, id).await?;
    let roles = roles::queries::find_by_user(&state.db, id).await?;
    Ok(Json(UserRolesResponse { roles }))
}

/// Replace a user's role assignments.
/// PUT /api/users/user/{id}/roles
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn assign_roles(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
    Json(body): Json<AssignRolesRequest>,
) -> ApiResult<StatusCode> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if body.role_ids.iter().any(|role_id| *role_id <= 0) {
        return Err(ApiError::BadRequest("Invalid id: expected a positive integer".into()));
    }

    queries::find_one(&state.db, id).await?;
    let old = RoleAssignment {
        user_id: id,
        role_ids: role_ids(&roles::queries::find_by_user(&state.db, id).await?),
    };

    queries::replace_roles(&state.db, id, &body.role_ids).await?;

    let new = RoleAssignment {
        user_id: id,
        role_ids: role_ids(&roles::queries::find_by_user(&state.db, id).await?),
    };

    audit::record(
        &state.db,
        &AuditEntry::update(AuditTable::UserRoles, id, auth_user.id, &old, &new),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn role_ids(roles: &[roles::Role]) -> Vec<i64> {
    roles.iter().map(|role| role.id).collect()
}
