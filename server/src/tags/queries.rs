//! Tag queries. Deletion is hard and cascades to post assignments.

use sqlx::PgPool;

use super::types::Tag;
use crate::db::{db_error, Patch};
use crate::error::{ApiError, ApiResult};

fn tag_conflict(query: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
    move |e| match ApiError::database(query)(e) {
        ApiError::Conflict(_) => ApiError::Conflict("Tag already exists".into()),
        other => other,
    }
}

pub async fn create(pool: &PgPool, name: &str) -> ApiResult<Tag> {
    sqlx::query_as::<_, Tag>("INSERT INTO tags (name) VALUES ($1) RETURNING id, name")
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(tag_conflict("tags::create"))
}

pub async fn find_one(pool: &PgPool, id: i64) -> ApiResult<Tag> {
    sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("tags::find_one", tag_id = id))?
        .ok_or_else(|| ApiError::NotFound("Tag not found".into()))
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> ApiResult<Vec<Tag>> {
    sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY id LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(db_error!("tags::list", limit = limit, offset = offset))
}

pub async fn count(pool: &PgPool) -> ApiResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tags")
        .fetch_one(pool)
        .await
        .map_err(db_error!("tags::count", scope = "all"))
}

/// Tags attached to a post, by name.
pub async fn find_by_post(pool: &PgPool, post_id: i64) -> ApiResult<Vec<Tag>> {
    sqlx::query_as::<_, Tag>(
        r"
        SELECT t.id, t.name
        FROM tags t
        INNER JOIN post_tags pt ON pt.tag_id = t.id
        WHERE pt.post_id = $1
        ORDER BY t.name
        ",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("tags::find_by_post", post_id = post_id))
}

pub async fn update(pool: &PgPool, id: i64, name: Option<String>) -> ApiResult<Tag> {
    let mut patch = Patch::new("tags");
    patch.set("name", name);

    let mut query = patch.finish(id, None, "id, name")?;
    query
        .build_query_as::<Tag>()
        .fetch_optional(pool)
        .await
        .map_err(tag_conflict("tags::update"))?
        .ok_or_else(|| ApiError::NotFound("Tag not found".into()))
}

/// Delete a tag, returning the removed row.
pub async fn delete(pool: &PgPool, id: i64) -> ApiResult<Tag> {
    sqlx::query_as::<_, Tag>("DELETE FROM tags WHERE id = $1 RETURNING id, name")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("tags::delete", tag_id = id))?
        .ok_or_else(|| ApiError::NotFound("Tag not found".into()))
}
