//! Posts
//!
//! Markdown posts with named content blocks, tags and a view counter.
//! Reads and view registration are public; everything else needs a session.

mod filters;
mod handlers;
pub mod queries;
mod types;
mod upload;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::{protected, AppState};
use crate::permissions::{require, PermissionRequirement, Permissions};

pub use filters::{PostOrderBy, PostSearch, SearchParams, SortDirection};
pub use types::{NewPost, Post, PostContent, PostDetail, PostPatch, PostStatus, MAIN_CONTENT};
pub use upload::{is_markdown, RawUpload, UploadForm, UploadedFile};

/// Create the posts router.
///
/// Public routes:
/// - GET /post/{id} - Active post with tags and content blocks
/// - GET /all - Search posts
/// - PUT /view/{id} - Register a view
///
/// Protected routes:
/// - GET /download/{id} - Markdown download (UpdatePosts)
/// - PUT /archive/{id} - Archive (UpdatePosts)
/// - POST /upload - Create or overwrite from markdown (CreatePosts or UpdatePosts)
/// - DELETE /post/{id} - Soft delete (DeletePosts)
/// - PUT /restore/{id} - Restore a deleted post (DeletePosts)
/// - PUT /post/{id}/tags - Replace tags (UpdatePosts)
/// - POST /post/{id}/content - Add a content block (UpdatePosts)
/// - PUT /post/{id}/content/{content_id} - Update a content block (UpdatePosts)
pub fn router(state: &AppState) -> Router<AppState> {
    let guarded = |route, permission| require(route, state, PermissionRequirement::one(permission));

    let private = Router::new()
        .route(
            "/download/{id}",
            guarded(get(handlers::download_post), Permissions::UPDATE_POSTS),
        )
        .route(
            "/archive/{id}",
            guarded(put(handlers::archive_post), Permissions::UPDATE_POSTS),
        )
        .route(
            "/upload",
            require(
                post(handlers::upload_post),
                state,
                PermissionRequirement::any([Permissions::CREATE_POSTS, Permissions::UPDATE_POSTS]),
            ),
        )
        .route(
            "/post/{id}",
            guarded(delete(handlers::delete_post), Permissions::DELETE_POSTS),
        )
        .route(
            "/restore/{id}",
            guarded(put(handlers::restore_post), Permissions::DELETE_POSTS),
        )
        .route(
            "/post/{id}/tags",
            guarded(put(handlers::replace_tags), Permissions::UPDATE_POSTS),
        )
        .route(
            "/post/{id}/content",
            guarded(post(handlers::add_content), Permissions::UPDATE_POSTS),
        )
        .route(
            "/post/{id}/content/{content_id}",
            guarded(put(handlers::update_content), Permissions::UPDATE_POSTS),
        );

    Router::new()
        .route("/post/{id}", get(handlers::get_post))
        .route("/all", get(handlers::search_posts))
        .route("/view/{id}", put(handlers::register_view))
        .merge(protected(private, state))
}
