//! Post queries.
//!
//! A post's body is its `main` content block; every read joins it back in
//! as `Post::content`.

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::filters::PostSearch;
use super::types::{NewPost, Post, PostContent, PostPatch, PostStatus, MAIN_CONTENT};
use crate::db::{db_error, Patch, EMPTY_PATCH};
use crate::error::{ApiError, ApiResult};

const POST_SELECT: &str = r"
    SELECT p.id, p.title, p.short_description, p.user_id, p.status, p.keywords, p.views,
           p.created_at, p.last_update, c.content
    FROM posts p
    LEFT JOIN post_contents c ON c.post_id = p.id AND c.identifier = 'main'";

fn not_found() -> ApiError {
    ApiError::NotFound("Post not found".into())
}

/// Find a post in any state.
pub async fn find_by_id(pool: &PgPool, id: i64) -> ApiResult<Option<Post>> {
    sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("posts::find_by_id", post_id = id))
}

/// Find an active post or fail with `NotFound`.
pub async fn find_active(pool: &PgPool, id: i64) -> ApiResult<Post> {
    find_by_id(pool, id)
        .await?
        .filter(|post| post.status == PostStatus::Active)
        .ok_or_else(not_found)
}

/// Page through posts matching `search`.
pub async fn search(
    pool: &PgPool,
    search: &PostSearch,
    limit: i64,
    offset: i64,
) -> ApiResult<Vec<Post>> {
    let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
    search.push_where(&mut qb);
    qb.push(search.order_clause())
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<Post>()
        .fetch_all(pool)
        .await
        .map_err(db_error!("posts::search", limit = limit, offset = offset))
}

/// Number of posts matching `search`, ignoring pagination.
pub async fn count(pool: &PgPool, search: &PostSearch) -> ApiResult<i64> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM posts p \
         LEFT JOIN post_contents c ON c.post_id = p.id AND c.identifier = 'main'",
    );
    search.push_where(&mut qb);

    qb.build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(db_error!("posts::count", status = ?search.status))
}

/// Create a post and its `main` content block atomically.
pub async fn create(pool: &PgPool, new: NewPost) -> ApiResult<Post> {
    let mut tx = pool
        .begin()
        .await
        .map_err(db_error!("posts::create", user_id = new.user_id))?;

    let id = sqlx::query_scalar::<_, i64>(
        r"
        INSERT INTO posts (title, short_description, user_id, keywords)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(&new.title)
    .bind(&new.short_description)
    .bind(new.user_id)
    .bind(&new.keywords)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error!("posts::create", user_id = new.user_id))?;

    sqlx::query("INSERT INTO post_contents (post_id, identifier, content) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(MAIN_CONTENT)
        .bind(&new.content)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("posts::create", post_id = id))?;

    tx.commit()
        .await
        .map_err(db_error!("posts::create", post_id = id))?;

    find_by_id(pool, id).await?.ok_or_else(not_found)
}

/// Apply a partial update to an active post.
///
/// `content` replaces the `main` block, creating it when missing.
pub async fn update(pool: &PgPool, id: i64, patch: PostPatch) -> ApiResult<Post> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest(EMPTY_PATCH.into()));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(db_error!("posts::update", post_id = id))?;

    let mut columns = Patch::new("posts").touching_last_update();
    columns
        .set("title", patch.title)
        .set("short_description", patch.short_description)
        .set("user_id", patch.user_id)
        .set("keywords", patch.keywords);

    let updated = if columns.is_empty() {
        sqlx::query("UPDATE posts SET last_update = NOW() WHERE id = $1 AND status = 'active'")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error!("posts::update", post_id = id))?
            .rows_affected()
    } else {
        let mut query = columns.finish(id, Some("status = 'active'"), "id")?;
        query
            .build()
            .execute(&mut *tx)
            .await
            .map_err(db_error!("posts::update", post_id = id))?
            .rows_affected()
    };
    if updated == 0 {
        return Err(not_found());
    }

    if let Some(content) = patch.content {
        sqlx::query(
            r"
            INSERT INTO post_contents (post_id, identifier, content)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, identifier) DO UPDATE SET content = EXCLUDED.content
            ",
        )
        .bind(id)
        .bind(MAIN_CONTENT)
        .bind(content)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("posts::update", post_id = id))?;
    }

    tx.commit()
        .await
        .map_err(db_error!("posts::update", post_id = id))?;

    find_by_id(pool, id).await?.ok_or_else(not_found)
}

/// Move a post from `from` to `to`, returning the post before and after.
async fn transition(
    pool: &PgPool,
    id: i64,
    from: PostStatus,
    to: PostStatus,
) -> ApiResult<Option<(Post, Post)>> {
    let Some(before) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    if before.status != from {
        return Ok(None);
    }

    let moved = sqlx::query(
        "UPDATE posts SET status = $1, last_update = NOW() WHERE id = $2 AND status = $3",
    )
    .bind(to)
    .bind(id)
    .bind(from)
    .execute(pool)
    .await
    .map_err(db_error!("posts::transition", post_id = id, to = ?to))?
    .rows_affected();
    if moved == 0 {
        return Ok(None);
    }

    let after = find_by_id(pool, id).await?.ok_or_else(not_found)?;
    Ok(Some((before, after)))
}

/// Active → Inactive.
pub async fn archive(pool: &PgPool, id: i64) -> ApiResult<(Post, Post)> {
    transition(pool, id, PostStatus::Active, PostStatus::Inactive)
        .await?
        .ok_or_else(not_found)
}

/// Active → Deleted. Returns the post as it was before deletion.
pub async fn soft_delete(pool: &PgPool, id: i64) -> ApiResult<Post> {
    transition(pool, id, PostStatus::Active, PostStatus::Deleted)
        .await?
        .map(|(before, _)| before)
        .ok_or_else(not_found)
}

/// Deleted → Active. Only deleted posts can be restored.
pub async fn restore(pool: &PgPool, id: i64) -> ApiResult<(Post, Post)> {
    let current = find_by_id(pool, id).await?.ok_or_else(not_found)?;
    if current.status != PostStatus::Deleted {
        return Err(ApiError::BadRequest("Post is not deleted".into()));
    }
    transition(pool, id, PostStatus::Deleted, PostStatus::Active)
        .await?
        .ok_or_else(not_found)
}

/// Count a view on an active post.
pub async fn register_view(pool: &PgPool, id: i64) -> ApiResult<()> {
    let result = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1 AND status = 'active'")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("posts::register_view", post_id = id))?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }
    Ok(())
}

/// Ids of the tags attached to a post.
pub async fn tag_ids(pool: &PgPool, post_id: i64) -> ApiResult<Vec<i64>> {
    sqlx::query_scalar::<_, i64>("SELECT tag_id FROM post_tags WHERE post_id = $1 ORDER BY tag_id")
        .bind(post_id)
        .fetch_all(pool)
        .await
        .map_err(db_error!("posts::tag_ids", post_id = post_id))
}

/// Replace every tag of a post in one transaction.
pub async fn replace_tags(pool: &PgPool, post_id: i64, tag_ids: &[i64]) -> ApiResult<()> {
    let mut tag_ids = tag_ids.to_vec();
    tag_ids.sort_unstable();
    tag_ids.dedup();

    let mut tx = pool
        .begin()
        .await
        .map_err(db_error!("posts::replace_tags", post_id = post_id))?;

    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("posts::replace_tags", post_id = post_id))?;

    if !tag_ids.is_empty() {
        let inserted = sqlx::query(
            r"
            INSERT INTO post_tags (post_id, tag_id)
            SELECT $1, t.id FROM tags t WHERE t.id = ANY($2)
            ",
        )
        .bind(post_id)
        .bind(&tag_ids)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("posts::replace_tags", post_id = post_id))?;

        if inserted.rows_affected() != tag_ids.len() as u64 {
            return Err(ApiError::NotFound("Tag not found".into()));
        }
    }

    tx.commit()
        .await
        .map_err(db_error!("posts::replace_tags", post_id = post_id))?;
    Ok(())
}

/// Every content block of a post, `main` first.
pub async fn contents(pool: &PgPool, post_id: i64) -> ApiResult<Vec<PostContent>> {
    sqlx::query_as::<_, PostContent>(
        r"
        SELECT id, post_id, identifier, content
        FROM post_contents
        WHERE post_id = $1
        ORDER BY identifier <> 'main', id
        ",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("posts::contents", post_id = post_id))
}

pub async fn find_content(pool: &PgPool, post_id: i64, content_id: i64) -> ApiResult<PostContent> {
    sqlx::query_as::<_, PostContent>(
        "SELECT id, post_id, identifier, content FROM post_contents WHERE id = $1 AND post_id = $2",
    )
    .bind(content_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("posts::find_content", post_id = post_id, content_id = content_id))?
    .ok_or_else(|| ApiError::NotFound("Content not found".into()))
}

/// Add a content block; identifiers are unique per post.
pub async fn add_content(
    pool: &PgPool,
    post_id: i64,
    identifier: &str,
    content: &str,
) -> ApiResult<PostContent> {
    sqlx::query_as::<_, PostContent>(
        r"
        INSERT INTO post_contents (post_id, identifier, content)
        VALUES ($1, $2, $3)
        RETURNING id, post_id, identifier, content
        ",
    )
    .bind(post_id)
    .bind(identifier)
    .bind(content)
    .fetch_one(pool)
    .await
    .map_err(|e| match ApiError::database("posts::add_content")(e) {
        ApiError::Conflict(_) => ApiError::Conflict("Content block already exists".into()),
        other => other,
    })
}

/// Partially update a content block of `post_id`.
pub async fn update_content(
    pool: &PgPool,
    post_id: i64,
    content_id: i64,
    identifier: Option<String>,
    content: Option<String>,
) -> ApiResult<PostContent> {
    let mut patch = Patch::new("post_contents").scoped_to("post_id", post_id);
    patch.set("identifier", identifier).set("content", content);

    let mut query = patch.finish(content_id, None, "id, post_id, identifier, content")?;
    query
        .build_query_as::<PostContent>()
        .fetch_optional(pool)
        .await
        .map_err(|e| match ApiError::database("posts::update_content")(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Content block already exists".into()),
            other => other,
        })?
        .ok_or_else(|| ApiError::NotFound("Content not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::filters::SearchParams;

    async fn author(pool: &PgPool) -> i64 {
        crate::users::queries::create(pool, "Author", "author@example.com", "hash")
            .await
            .unwrap()
            .id
    }

    fn new_post(user_id: i64, title: &str) -> NewPost {
        NewPost {
            title: title.into(),
            short_description: "Summary".into(),
            user_id,
            keywords: vec!["rust".into(), "axum".into()],
            content: "# Heading\n\nBody".into(),
        }
    }

    #[sqlx::test]
    #[ignore] // Requires PostgreSQL
    async fn test_create_then_read_back(pool: PgPool) {
        let user_id = author(&pool).await;
        let post = create(&pool, new_post(user_id, "Ownership")).await.unwrap();

        let found = find_active(&pool, post.id).await.unwrap();
        assert_eq!(found.title, "Ownership");
        assert_eq!(found.content.as_deref(), Some("# Heading\n\nBody"));
        assert_eq!(found.keywords, vec!["rust".to_string(), "axum".to_string()]);
        assert_eq!(found.views, 0);

        let blocks = contents(&pool, post.id).await.unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].identifier, MAIN_CONTENT);
    }

    #[sqlx::test]
    #[ignore] // Requires PostgreSQL
    async fn test_update_with_empty_patch_is_bad_request(pool: PgPool) {
        let user_id = author(&pool).await;
        let post = create(&pool, new_post(user_id, "Lifetimes")).await.unwrap();
        let err = update(&pool, post.id, PostPatch::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let updated = update(
            &pool,
            post.id,
            PostPatch {
                content: Some("new body".into()),
                ..PostPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.content.as_deref(), Some("new body"));
        assert_eq!(updated.title, "Lifetimes");
    }

    #[sqlx::test]
    #[ignore] // Requires PostgreSQL
    async fn test_status_transitions(pool: PgPool) {
        let user_id = author(&pool).await;
        let post = create(&pool, new_post(user_id, "Traits")).await.unwrap();

        assert!(matches!(restore(&pool, post.id).await, Err(ApiError::BadRequest(_))));

        let before = soft_delete(&pool, post.id).await.unwrap();
        assert_eq!(before.status, PostStatus::Active);
        assert!(matches!(find_active(&pool, post.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(register_view(&pool, post.id).await, Err(ApiError::NotFound(_))));

        let (_, after) = restore(&pool, post.id).await.unwrap();
        assert_eq!(after.status, PostStatus::Active);

        let (_, archived) = archive(&pool, post.id).await.unwrap();
        assert_eq!(archived.status, PostStatus::Inactive);
        assert!(matches!(archive(&pool, post.id).await, Err(ApiError::NotFound(_))));
    }

    #[sqlx::test]
    #[ignore] // Requires PostgreSQL
    async fn test_views_increment(pool: PgPool) {
        let user_id = author(&pool).await;
        let post = create(&pool, new_post(user_id, "Async")).await.unwrap();
        register_view(&pool, post.id).await.unwrap();
        register_view(&pool, post.id).await.unwrap();
        assert_eq!(find_active(&pool, post.id).await.unwrap().views, 2);
    }

    #[sqlx::test]
    #[ignore] // Requires PostgreSQL
    async fn test_search_filters_and_counts(pool: PgPool) {
        let user_id = author(&pool).await;
        create(&pool, new_post(user_id, "Rust macros")).await.unwrap();
        create(&pool, new_post(user_id, "Go channels")).await.unwrap();
        let archived = create(&pool, new_post(user_id, "Rust archived")).await.unwrap();
        archive(&pool, archived.id).await.unwrap();

        let query = PostSearch::parse(SearchParams {
            query: Some("macros".into()),
            ..SearchParams::default()
        })
        .unwrap();
        let found = search(&pool, &query, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(count(&pool, &query).await.unwrap(), 1);

        let all_active = PostSearch::parse(SearchParams::default()).unwrap();
        assert_eq!(count(&pool, &all_active).await.unwrap(), 2);

        let inactive = PostSearch::parse(SearchParams {
            status: Some("inactive".into()),
            ..SearchParams::default()
        })
        .unwrap();
        assert_eq!(search(&pool, &inactive, 10, 0).await.unwrap()[0].id, archived.id);
    }

    #[sqlx::test]
    #[ignore] // Requires PostgreSQL
    async fn test_content_blocks(pool: PgPool) {
        let user_id = author(&pool).await;
        let post = create(&pool, new_post(user_id, "Blocks")).await.unwrap();

        let block = add_content(&pool, post.id, "appendix", "More").await.unwrap();
        let dup = add_content(&pool, post.id, "appendix", "Again").await.unwrap_err();
        assert!(matches!(dup, ApiError::Conflict(_)));

        let updated = update_content(&pool, post.id, block.id, None, Some("Less".into()))
            .await
            .unwrap();
        assert_eq!(updated.content, "Less");
        assert_eq!(updated.identifier, "appendix");

        let other = create(&pool, new_post(user_id, "Elsewhere")).await.unwrap();
        let foreign = update_content(&pool, other.id, block.id, None, Some("Hijack".into()))
            .await
            .unwrap_err();
        assert!(matches!(foreign, ApiError::NotFound(_)));

        let blocks = contents(&pool, post.id).await.unwrap();
        assert_eq!(blocks[0].identifier, MAIN_CONTENT);
        assert_eq!(blocks.len(), 2);
    }
}
