//! Tags

mod handlers;
pub mod queries;
mod types;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::AppState;
use crate::permissions::{require, PermissionRequirement, Permissions};

pub use types::{CreateTagRequest, Tag, UpdateTagRequest};

/// Create the tags router.
///
/// - GET /all - List tags (ReadTags)
/// - GET /post/{id} - Tags of a post (ReadTags)
/// - POST /new - Create a tag (CreateTags)
/// - PUT /tag/{id} - Rename a tag (UpdateTags)
/// - DELETE /tag/{id} - Delete a tag (DeleteTags)
pub fn router(state: &AppState) -> Router<AppState> {
    let guarded = |route, permission| require(route, state, PermissionRequirement::one(permission));

    Router::new()
        .route("/all", guarded(get(handlers::list_tags), Permissions::READ_TAGS))
        .route("/post/{id}", guarded(get(handlers::tags_of_post), Permissions::READ_TAGS))
        .route("/new", guarded(post(handlers::create_tag), Permissions::CREATE_TAGS))
        .route("/tag/{id}", guarded(put(handlers::update_tag), Permissions::UPDATE_TAGS))
        .route("/tag/{id}", guarded(delete(handlers::delete_tag), Permissions::DELETE_TAGS))
}
