//! Post HTTP Handlers

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use super::filters::PostSearch;
use super::queries;
use super::types::{
    ContentResponse, CreateContentRequest, NewPost, PostDetail, PostListResponse, PostPatch,
    PostResponse, ReplaceTagsRequest, TagAssignment, UpdateContentRequest, UploadResponse,
};
use super::upload::RawUpload;
use crate::api::{parse_id, AppState, Pagination, ResourceId};
use crate::audit::{self, AuditEntry, AuditTable};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::permissions::{CallerRoles, PermissionRequirement, Permissions};
use crate::tags;

/// Get an active post with its tags and content blocks.
/// GET /api/posts/post/{id}
#[tracing::instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Json<PostResponse>> {
    let post = queries::find_active(&state.db, id).await?;
    let tags = tags::queries::find_by_post(&state.db, id).await?;
    let contents = queries::contents(&state.db, id).await?;
    Ok(Json(PostResponse {
        post: PostDetail {
            post,
            tags,
            contents,
        },
    }))
}

/// Search posts.
/// GET /api/posts/all
#[tracing::instrument(skip(state))]
pub async fn search_posts(
    State(state): State<AppState>,
    pagination: Pagination,
    search: PostSearch,
) -> ApiResult<Json<PostListResponse>> {
    let posts = queries::search(&state.db, &search, pagination.limit, pagination.offset()).await?;
    let count = queries::count(&state.db, &search).await?;
    Ok(Json(PostListResponse { posts, count }))
}

/// Register a view on an active post.
/// PUT /api/posts/view/{id}
#[tracing::instrument(skip(state))]
pub async fn register_view(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    queries::register_view(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download the post body as a markdown attachment.
/// GET /api/posts/download/{id}
#[tracing::instrument(skip(state))]
pub async fn download_post(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Response> {
    let post = queries::find_active(&state.db, id).await?;
    let headers = [
        (header::CONTENT_TYPE, "text/markdown".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.md\"", download_name(&post.title)),
        ),
    ];
    Ok((headers, post.content.unwrap_or_default()).into_response())
}

/// Title reduced to characters that are safe inside a quoted header value.
fn download_name(title: &str) -> String {
    let name: String = title
        .chars()
        .map(|c| if c.is_control() || c == '"' || c == '\\' { '_' } else { c })
        .take(200)
        .collect();
    if name.trim().is_empty() {
        "post".to_string()
    } else {
        name
    }
}

/// Archive an active post.
/// PUT /api/posts/archive/{id}
#[tracing::instrument(skip(state), fields(actor = auth_user.id))]
pub async fn archive_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    let (old, new) = queries::archive(&state.db, id).await?;
    audit::record(
        &state.db,
        &AuditEntry::update(AuditTable::Posts, id, auth_user.id, &old, &new),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a post from markdown, or overwrite one when `id` is given.
///
/// The route admits callers holding either `CreatePosts` or `UpdatePosts`;
/// the branch taken then needs its own permission.
///
/// POST /api/posts/upload
#[tracing::instrument(skip(state, caller_roles, multipart), fields(actor = auth_user.id))]
pub async fn upload_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    caller_roles: CallerRoles,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let max_files = state.config.max_upload_files;
    let form = RawUpload::read(multipart, max_files)
        .await?
        .into_form(max_files)?;

    let id = if let Some(id) = form.id {
        caller_roles.check(&PermissionRequirement::one(Permissions::UPDATE_POSTS))?;

        let old = queries::find_active(&state.db, id).await?;
        let new = queries::update(
            &state.db,
            id,
            PostPatch {
                title: Some(form.title),
                short_description: Some(form.short_description),
                user_id: Some(auth_user.id),
                keywords: Some(form.keywords),
                content: Some(form.content),
            },
        )
        .await?;

        audit::record(
            &state.db,
            &AuditEntry::update(AuditTable::Posts, id, auth_user.id, &old, &new),
        )
        .await?;
        id
    } else {
        caller_roles.check(&PermissionRequirement::one(Permissions::CREATE_POSTS))?;

        let post = queries::create(
            &state.db,
            NewPost {
                title: form.title,
                short_description: form.short_description,
                user_id: auth_user.id,
                keywords: form.keywords,
                content: form.content,
            },
        )
        .await?;

        audit::record(
            &state.db,
            &AuditEntry::insert(AuditTable::Posts, post.id, auth_user.id, &post),
        )
        .await?;
        post.id
    };

    tracing::info!(post_id = id, "Post saved");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Post saved sucessfully!",
            id,
        }),
    ))
}

/// Soft-delete an active post.
/// DELETE /api/posts/post/{id}
#[tracing::instrument(skip(state), fields(actor = auth_user.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    let before = queries::soft_delete(&state.db, id).await?;
    audit::record(
        &state.db,
        &AuditEntry::delete(AuditTable::Posts, id, auth_user.id, &before),
    )
    .await?;

    tracing::info!(post_id = id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Bring a deleted post back.
/// PUT /api/posts/restore/{id}
#[tracing::instrument(skip(state), fields(actor = auth_user.id))]
pub async fn restore_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    let (old, new) = queries::restore(&state.db, id).await?;
    audit::record(
        &state.db,
        &AuditEntry::update(AuditTable::Posts, id, auth_user.id, &old, &new),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the tags of an active post.
/// PUT /api/posts/post/{id}/tags
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn replace_tags(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
    Json(body): Json<ReplaceTagsRequest>,
) -> ApiResult<StatusCode> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if body.tag_ids.iter().any(|tag_id| *tag_id <= 0) {
        return Err(ApiError::BadRequest("Invalid id: expected a positive integer".into()));
    }

    queries::find_active(&state.db, id).await?;
    let old = TagAssignment {
        post_id: id,
        tag_ids: queries::tag_ids(&state.db, id).await?,
    };

    queries::replace_tags(&state.db, id, &body.tag_ids).await?;

    let new = TagAssignment {
        post_id: id,
        tag_ids: queries::tag_ids(&state.db, id).await?,
    };
    audit::record(
        &state.db,
        &AuditEntry::update(AuditTable::PostTags, id, auth_user.id, &old, &new),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Add a content block to an active post.
/// POST /api/posts/post/{id}/content
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn add_content(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
    Json(body): Json<CreateContentRequest>,
) -> ApiResult<(StatusCode, Json<ContentResponse>)> {
    let body = body.trimmed();
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    queries::find_active(&state.db, id).await?;
    let content = queries::add_content(&state.db, id, &body.identifier, &body.content).await?;
    audit::record(
        &state.db,
        &AuditEntry::insert(AuditTable::PostContents, content.id, auth_user.id, &content),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ContentResponse { content })))
}

/// Partially update a content block.
/// PUT /api/posts/post/{id}/content/{content_id}
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn update_content(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((post_id, content_id)): Path<(String, String)>,
    Json(body): Json<UpdateContentRequest>,
) -> ApiResult<StatusCode> {
    let post_id = parse_id(&post_id)?;
    let content_id = parse_id(&content_id)?;
    let body = body.trimmed();
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    queries::find_active(&state.db, post_id).await?;
    let old = queries::find_content(&state.db, post_id, content_id).await?;
    body.check_rename(&old.identifier)?;
    let new = queries::update_content(
        &state.db,
        post_id,
        content_id,
        body.identifier,
        body.content,
    )
    .await?;

    audit::record(
        &state.db,
        &AuditEntry::update(AuditTable::PostContents, content_id, auth_user.id, &old, &new),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
