//! Post models and request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::ApiError;
use crate::tags::Tag;

/// Identifier of the content block that holds a post's body.
pub const MAIN_CONTENT: &str = "main";

/// Post lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Inactive,
    Deleted,
}

/// Post row joined with its `main` content block.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub short_description: String,
    pub user_id: i64,
    pub status: PostStatus,
    pub keywords: Vec<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub content: Option<String>,
}

/// A named block of post content.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
    pub id: i64,
    pub post_id: i64,
    pub identifier: String,
    pub content: String,
}

/// A post with its tags and every content block.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
    pub contents: Vec<PostContent>,
}

/// Fields written when a post is created.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub short_description: String,
    pub user_id: i64,
    pub keywords: Vec<String>,
    pub content: String,
}

/// Partial post update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub user_id: Option<i64>,
    pub keywords: Option<Vec<String>>,
    pub content: Option<String>,
}

impl PostPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.short_description.is_none()
            && self.user_id.is_none()
            && self.keywords.is_none()
            && self.content.is_none()
    }
}

/// Add a content block.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContentRequest {
    #[validate(length(min = 1, max = 100, message = "Post identifier must be between 1 and 100 characters long."))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Content is required."))]
    pub content: String,
}

/// Update a content block.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContentRequest {
    #[validate(length(min = 1, max = 100, message = "Post identifier must be between 1 and 100 characters long."))]
    pub identifier: Option<String>,
    pub content: Option<String>,
}

impl CreateContentRequest {
    /// Trim the identifier so validation sees what will be stored.
    #[must_use]
    pub fn trimmed(mut self) -> Self {
        self.identifier = self.identifier.trim().to_string();
        self
    }
}

impl UpdateContentRequest {
    /// Trim the identifier so validation sees what will be stored.
    #[must_use]
    pub fn trimmed(mut self) -> Self {
        self.identifier = self.identifier.map(|i| i.trim().to_string());
        self
    }

    /// The `main` block backs `Post.content`, so it keeps its name and no
    /// other block may take it.
    pub fn check_rename(&self, current: &str) -> Result<(), ApiError> {
        match self.identifier.as_deref() {
            Some(next) if next != current && (current == MAIN_CONTENT || next == MAIN_CONTENT) => {
                Err(ApiError::BadRequest(
                    "The main content block cannot be renamed".into(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Replace the tags of a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceTagsRequest {
    #[validate(length(max = 64, message = "Too many tags."))]
    pub tag_ids: Vec<i64>,
}

/// Tag-assignment snapshot for the audit log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAssignment {
    pub post_id: i64,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: PostDetail,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<Post>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: PostContent,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            id: 7,
            title: "Ownership".into(),
            short_description: "Borrowing explained".into(),
            user_id: 1,
            status: PostStatus::Active,
            keywords: vec!["rust".into()],
            views: 3,
            created_at: Utc::now(),
            last_update: Utc::now(),
            content: Some("# Ownership".into()),
        }
    }

    #[test]
    fn test_post_serializes_camel_case() {
        let json = serde_json::to_value(sample_post()).unwrap();
        assert_eq!(json["shortDescription"], "Borrowing explained");
        assert_eq!(json["userId"], 1);
        assert_eq!(json["status"], "active");
        assert_eq!(json["keywords"][0], "rust");
    }

    #[test]
    fn test_detail_flattens_post() {
        let detail = PostDetail {
            post: sample_post(),
            tags: vec![Tag {
                id: 1,
                name: "rust".into(),
            }],
            contents: Vec::new(),
        };
        let json = serde_json::to_value(detail).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["content"], "# Ownership");
        assert_eq!(json["tags"][0]["name"], "rust");
    }

    #[test]
    fn test_empty_patch_detection() {
        assert!(PostPatch::default().is_empty());
        let patch = PostPatch {
            content: Some(String::new()),
            ..PostPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_content_request_validation() {
        let ok = CreateContentRequest {
            identifier: "intro".into(),
            content: "Hello".into(),
        };
        assert!(ok.validate().is_ok());

        let empty = CreateContentRequest {
            identifier: String::new(),
            content: String::new(),
        };
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("identifier"));
        assert!(errors.field_errors().contains_key("content"));
    }

    #[test]
    fn test_blank_identifier_fails_after_trim() {
        let req = UpdateContentRequest {
            identifier: Some("   ".into()),
            content: None,
        }
        .trimmed();
        assert_eq!(req.identifier.as_deref(), Some(""));
        assert!(req.validate().is_err());

        let create = CreateContentRequest {
            identifier: "  ".into(),
            content: "Body".into(),
        }
        .trimmed();
        assert!(create.validate().is_err());
    }

    #[test]
    fn test_main_block_cannot_be_renamed() {
        let rename = |identifier: &str| UpdateContentRequest {
            identifier: Some(identifier.into()),
            content: None,
        };

        assert!(rename("intro").check_rename(MAIN_CONTENT).is_err());
        assert!(rename(MAIN_CONTENT).check_rename("appendix").is_err());
        assert!(rename(MAIN_CONTENT).check_rename(MAIN_CONTENT).is_ok());
        assert!(rename("outro").check_rename("appendix").is_ok());

        let content_only = UpdateContentRequest {
            identifier: None,
            content: Some("Body".into()),
        };
        assert!(content_only.check_rename(MAIN_CONTENT).is_ok());
    }
}
