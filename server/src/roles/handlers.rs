//! Role HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use super::queries;
use super::types::{
    parse_permissions, CreateRoleRequest, Role, RoleListResponse, RoleResponse,
    UpdateRoleRequest,
};
use crate::api::{AppState, Pagination, ResourceId};
use crate::audit::{self, AuditEntry, AuditTable};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};

/// List roles.
/// GET /api/roles/all
#[tracing::instrument(skip(state))]
pub async fn list_roles(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<Json<RoleListResponse>> {
    let roles = queries::list(&state.db, pagination.limit, pagination.offset()).await?;
    let count = queries::count(&state.db).await?;
    Ok(Json(RoleListResponse { roles, count }))
}

/// Get one role.
/// GET /api/roles/role/{id}
#[tracing::instrument(skip(state))]
pub async fn get_role(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<RoleResponse>> {
    let role = queries::find_one(&state.db, id).await?;
    Ok(Json(RoleResponse { role }))
}

/// Roles assigned to a user.
/// GET /api/roles/user/{id}
#[tracing::instrument(skip(state))]
pub async fn roles_of_user(
    State(state): State<AppState>,
    ResourceId(user_id): ResourceId,
) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(queries::find_by_user(&state.db, user_id).await?))
}

/// Create a role.
/// POST /api/roles/role
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn create_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let permissions = parse_permissions(body.permissions)?;

    let role = queries::create(&state.db, body.name.trim(), permissions).await?;

    audit::record(
        &state.db,
        &AuditEntry::insert(AuditTable::Roles, role.id, auth_user.id, &role),
    )
    .await?;

    tracing::info!(role_id = role.id, permissions = role.permissions.bits(), "Role created");
    Ok((StatusCode::CREATED, Json(RoleResponse { role })))
}

/// Update a role's name and/or permissions.
/// PUT /api/roles/role/{id}
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn update_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
    Json(body): Json<UpdateRoleRequest>,
) -> ApiResult<StatusCode> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let permissions = body.permissions.map(parse_permissions).transpose()?;

    let old = queries::find_one(&state.db, id).await?;
    let new = queries::update(
        &state.db,
        id,
        body.name.map(|n| n.trim().to_string()),
        permissions,
    )
    .await?;

    audit::record(
        &state.db,
        &AuditEntry::update(AuditTable::Roles, id, auth_user.id, &old, &new),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove a role permanently.
/// DELETE /api/roles/role/{id}
#[tracing::instrument(skip(state), fields(actor = auth_user.id))]
pub async fn delete_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    let removed = queries::delete(&state.db, id).await?;

    audit::record(
        &state.db,
        &AuditEntry::delete(AuditTable::Roles, id, auth_user.id, &removed),
    )
    .await?;

    tracing::info!(role_id = id, "Role deleted");
    Ok(StatusCode::NO_CONTENT)
}
