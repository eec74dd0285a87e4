//! Tag models and request bodies.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Tag names are plain ASCII alphanumerics.
static TAG_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("valid regex"));

/// Tag row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Create tag request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(
        length(min = 3, max = 100, message = "Tag name must be between 3 and 100 characters long."),
        regex(path = "TAG_NAME_REGEX", message = "Tag must be an alphanumeric string")
    )]
    pub name: String,
}

/// Update tag request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(
        length(min = 3, max = 100, message = "Tag name must be between 3 and 100 characters long."),
        regex(path = "TAG_NAME_REGEX", message = "Tag must be an alphanumeric string")
    )]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub tag: Tag,
}

#[derive(Debug, Serialize)]
pub struct TagListResponse {
    pub tags: Vec<Tag>,
    pub count: i64,
}
