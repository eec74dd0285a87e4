//! Role queries and role resolution.

use sqlx::PgPool;

use super::types::Role;
use crate::db::{db_error, Patch};
use crate::error::{ApiError, ApiResult};
use crate::permissions::Permissions;

/// Create a role. Duplicate names are a conflict.
pub async fn create(pool: &PgPool, name: &str, permissions: Permissions) -> ApiResult<Role> {
    sqlx::query_as::<_, Role>(
        "INSERT INTO roles (name, permissions) VALUES ($1, $2) RETURNING id, name, permissions",
    )
    .bind(name)
    .bind(permissions.to_db())
    .fetch_one(pool)
    .await
    .map_err(db_error!("roles::create", name = %name))
}

/// Find a role by id or fail with `NotFound`.
pub async fn find_one(pool: &PgPool, id: i64) -> ApiResult<Role> {
    sqlx::query_as::<_, Role>("SELECT id, name, permissions FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("roles::find_one", role_id = id))?
        .ok_or_else(|| ApiError::NotFound("Role not found".into()))
}

/// Find a role by exact name.
pub async fn find_by_name(pool: &PgPool, name: &str) -> ApiResult<Option<Role>> {
    sqlx::query_as::<_, Role>("SELECT id, name, permissions FROM roles WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("roles::find_by_name", name = %name))
}

/// Page through roles by id.
pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> ApiResult<Vec<Role>> {
    sqlx::query_as::<_, Role>(
        "SELECT id, name, permissions FROM roles ORDER BY id LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(db_error!("roles::list", limit = limit, offset = offset))
}

/// Count roles.
pub async fn count(pool: &PgPool) -> ApiResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles")
        .fetch_one(pool)
        .await
        .map_err(db_error!("roles::count", scope = "all"))
}

/// All roles assigned to a user.
///
/// Returned individually so the guard can evaluate each role on its own.
pub async fn find_by_user(pool: &PgPool, user_id: i64) -> ApiResult<Vec<Role>> {
    sqlx::query_as::<_, Role>(
        r"
        SELECT r.id, r.name, r.permissions
        FROM roles r
        INNER JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = $1
        ORDER BY r.id
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("roles::find_by_user", user_id = user_id))
}

/// Apply a partial update.
pub async fn update(
    pool: &PgPool,
    id: i64,
    name: Option<String>,
    permissions: Option<Permissions>,
) -> ApiResult<Role> {
    let mut patch = Patch::new("roles");
    patch
        .set("name", name)
        .set("permissions", permissions.map(Permissions::to_db));

    let mut query = patch.finish(id, None, "id, name, permissions")?;
    query
        .build_query_as::<Role>()
        .fetch_optional(pool)
        .await
        .map_err(db_error!("roles::update", role_id = id))?
        .ok_or_else(|| ApiError::NotFound("Role not found".into()))
}

/// Hard-delete a role, returning the removed row.
pub async fn delete(pool: &PgPool, id: i64) -> ApiResult<Role> {
    sqlx::query_as::<_, Role>("DELETE FROM roles WHERE id = $1 RETURNING id, name, permissions")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("roles::delete", role_id = id))?
        .ok_or_else(|| ApiError::NotFound("Role not found".into()))
}
