//! User queries.
//!
//! Deleted users are soft-deleted: the row stays with `status = 'deleted'`
//! and is excluded from every lookup except [`find_status`].

use sqlx::{PgExecutor, PgPool};

use super::types::{User, UserStatus};
use crate::db::{db_error, Patch};
use crate::error::{ApiError, ApiResult};

const USER_COLUMNS: &str = "id, email, password_hash, name, status, created_at, last_update";

/// Create a user. Duplicate emails are a conflict.
pub async fn create<'e, E>(executor: E, name: &str, email: &str, password_hash: &str) -> ApiResult<User>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
    ))
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(executor)
    .await
    .map_err(|e| match ApiError::database("users::create")(e) {
        ApiError::Conflict(_) => ApiError::Conflict("User already exists".into()),
        other => other,
    })
}

/// Find a non-deleted user by id.
pub async fn find_by_id(pool: &PgPool, id: i64) -> ApiResult<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND status <> 'deleted'"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("users::find_by_id", user_id = id))
}

/// Find a non-deleted user by id or fail with `NotFound`.
pub async fn find_one(pool: &PgPool, id: i64) -> ApiResult<User> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

/// Find a non-deleted user by email.
pub async fn find_by_email(pool: &PgPool, email: &str) -> ApiResult<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND status <> 'deleted'"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("users::find_by_email", email = %email))
}

/// Whether any row (deleted or not) already uses `email`.
pub async fn email_taken(pool: &PgPool, email: &str) -> ApiResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(db_error!("users::email_taken", email = %email))
}

/// Status of a user at any lifecycle stage; `None` when the row is absent.
pub async fn find_status(pool: &PgPool, id: i64) -> ApiResult<Option<UserStatus>> {
    sqlx::query_scalar::<_, UserStatus>("SELECT status FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("users::find_status", user_id = id))
}

/// Page through non-deleted users, oldest first.
pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> ApiResult<Vec<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE status <> 'deleted' ORDER BY id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(db_error!("users::list", limit = limit, offset = offset))
}

/// Count non-deleted users.
pub async fn count(pool: &PgPool) -> ApiResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE status <> 'deleted'")
        .fetch_one(pool)
        .await
        .map_err(db_error!("users::count", scope = "non_deleted"))
}

/// Whether the user table is empty, including deleted rows.
pub async fn is_empty(pool: &PgPool) -> ApiResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT NOT EXISTS(SELECT 1 FROM users)")
        .fetch_one(pool)
        .await
        .map_err(db_error!("users::is_empty", scope = "all"))
}

/// Apply a partial update to a non-deleted user.
pub async fn update(
    pool: &PgPool,
    id: i64,
    name: Option<String>,
    email: Option<String>,
    status: Option<UserStatus>,
) -> ApiResult<User> {
    let mut patch = Patch::new("users").touching_last_update();
    patch
        .set("name", name)
        .set("email", email)
        .set("status", status);

    let mut query = patch.finish(id, Some("status <> 'deleted'"), USER_COLUMNS)?;
    query
        .build_query_as::<User>()
        .fetch_optional(pool)
        .await
        .map_err(db_error!("users::update", user_id = id))?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

/// Replace a user's password hash.
pub async fn update_password(pool: &PgPool, id: i64, password_hash: &str) -> ApiResult<()> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $1, last_update = NOW() WHERE id = $2 AND status <> 'deleted'",
    )
    .bind(password_hash)
    .bind(id)
    .execute(pool)
    .await
    .map_err(db_error!("users::update_password", user_id = id))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }
    Ok(())
}

/// Soft-delete a user, returning the row as it was before deletion.
pub async fn soft_delete(pool: &PgPool, id: i64) -> ApiResult<User> {
    let before = find_one(pool, id).await?;

    sqlx::query(
        "UPDATE users SET status = 'deleted', last_update = NOW() WHERE id = $1 AND status <> 'deleted'",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(db_error!("users::soft_delete", user_id = id))?;

    Ok(before)
}

/// Replace every role assignment of a user in one transaction.
pub async fn replace_roles(pool: &PgPool, user_id: i64, role_ids: &[i64]) -> ApiResult<()> {
    let mut role_ids = role_ids.to_vec();
    role_ids.sort_unstable();
    role_ids.dedup();

    let mut tx = pool
        .begin()
        .await
        .map_err(db_error!("users::replace_roles", user_id = user_id))?;

    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("users::replace_roles", user_id = user_id))?;

    if !role_ids.is_empty() {
        let inserted = sqlx::query(
            r"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, r.id FROM roles r WHERE r.id = ANY($2)
            ",
        )
        .bind(user_id)
        .bind(&role_ids)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("users::replace_roles", user_id = user_id))?;

        // Dropping the transaction rolls back the delete above.
        if inserted.rows_affected() != role_ids.len() as u64 {
            return Err(ApiError::NotFound("Role not found".into()));
        }
    }

    tx.commit()
        .await
        .map_err(db_error!("users::replace_roles", user_id = user_id))?;
    Ok(())
}

/// Assign a single role, ignoring existing assignments.
pub async fn assign_role<'e, E>(executor: E, user_id: i64, role_id: i64) -> ApiResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(role_id)
        .execute(executor)
        .await
        .map_err(db_error!("users::assign_role", user_id = user_id, role_id = role_id))?;
    Ok(())
}
