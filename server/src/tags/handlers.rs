//! Tag HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use super::queries;
use super::types::{CreateTagRequest, Tag, TagListResponse, TagResponse, UpdateTagRequest};
use crate::api::{AppState, Pagination, ResourceId};
use crate::audit::{self, AuditEntry, AuditTable};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};

/// GET /api/tags/all
#[tracing::instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<Json<TagListResponse>> {
    let tags = queries::list(&state.db, pagination.limit, pagination.offset()).await?;
    let count = queries::count(&state.db).await?;
    Ok(Json(TagListResponse { tags, count }))
}

/// GET /api/tags/post/{id}
#[tracing::instrument(skip(state))]
pub async fn tags_of_post(
    State(state): State<AppState>,
    ResourceId(post_id): ResourceId,
) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(queries::find_by_post(&state.db, post_id).await?))
}

/// POST /api/tags/new
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn create_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let tag = queries::create(&state.db, &body.name).await?;
    audit::record(
        &state.db,
        &AuditEntry::insert(AuditTable::Tags, tag.id, auth_user.id, &tag),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(TagResponse { tag })))
}

/// PUT /api/tags/tag/{id}
#[tracing::instrument(skip(state, body), fields(actor = auth_user.id))]
pub async fn update_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
    Json(body): Json<UpdateTagRequest>,
) -> ApiResult<StatusCode> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let old = queries::find_one(&state.db, id).await?;
    let new = queries::update(&state.db, id, body.name).await?;
    audit::record(
        &state.db,
        &AuditEntry::update(AuditTable::Tags, id, auth_user.id, &old, &new),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/tags/tag/{id}
#[tracing::instrument(skip(state), fields(actor = auth_user.id))]
pub async fn delete_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<StatusCode> {
    let removed = queries::delete(&state.db, id).await?;
    audit::record(
        &state.db,
        &AuditEntry::delete(AuditTable::Tags, id, auth_user.id, &removed),
    )
    .await?;

    tracing::info!(tag_id = id, "Tag deleted");
    Ok(StatusCode::NO_CONTENT)
}
