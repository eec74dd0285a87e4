//! Markdown upload form.
//!
//! Parts: one or more `files`, `title`, `shortDescription`, `keywords`
//! (repeated parts or a single JSON array) and an optional `id`. The first
//! file becomes the post body; every file must be markdown.

use axum::extract::Multipart;

use crate::api::parse_id;
use crate::error::{ApiError, ApiResult};

const MARKDOWN: &str = "text/markdown";

/// An uploaded file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Parts collected from the request, before validation.
#[derive(Debug, Default)]
pub struct RawUpload {
    pub id: Option<String>,
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub keywords: Vec<String>,
    pub files: Vec<UploadedFile>,
}

/// A validated upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    /// Post to overwrite; `None` creates a new post.
    pub id: Option<i64>,
    pub title: String,
    pub short_description: String,
    pub keywords: Vec<String>,
    pub content: String,
}

impl RawUpload {
    /// Drain a multipart body. Stops early once more than `max_files` file
    /// parts have been seen.
    pub async fn read(mut multipart: Multipart, max_files: usize) -> ApiResult<Self> {
        let mut raw = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "files" => {
                    if raw.files.len() >= max_files {
                        return Err(too_many_files(max_files));
                    }
                    let file_name = field.file_name().map(String::from);
                    let content_type = field.content_type().map(String::from);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    raw.files.push(UploadedFile {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
                "id" | "title" | "shortDescription" | "keywords" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    match name.as_str() {
                        "id" => raw.id = Some(text),
                        "title" => raw.title = Some(text),
                        "shortDescription" => raw.short_description = Some(text),
                        _ => raw.keywords.push(text),
                    }
                }
                _ => {}
            }
        }

        Ok(raw)
    }

    /// Validate the collected parts.
    pub fn into_form(self, max_files: usize) -> ApiResult<UploadForm> {
        if self.files.is_empty() {
            return Err(ApiError::BadRequest("No files uploaded".into()));
        }
        if self.files.len() > max_files {
            return Err(too_many_files(max_files));
        }
        if !self
            .files
            .iter()
            .all(|file| is_markdown(file.content_type.as_deref(), file.file_name.as_deref()))
        {
            return Err(ApiError::BadRequest("Only MD files are allowed".into()));
        }

        let id = match self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(raw) => Some(parse_id(raw)?),
            None => None,
        };

        let title = required(self.title, "Title is required.")?;
        if title.chars().count() > 255 {
            return Err(ApiError::BadRequest(
                "Title must be at most 255 characters long.".into(),
            ));
        }
        let short_description = required(self.short_description, "Short description is required.")?;
        if short_description.chars().count() > 300 {
            return Err(ApiError::BadRequest(
                "Short description must be at most 300 characters long.".into(),
            ));
        }

        let keywords = parse_keywords(self.keywords)?;
        if keywords.is_empty() {
            return Err(ApiError::BadRequest("Keywords are required.".into()));
        }

        let mut files = self.files.into_iter();
        let content = files
            .next()
            .map(|file| String::from_utf8(file.data))
            .transpose()
            .map_err(|_| ApiError::BadRequest("File content must be valid UTF-8".into()))?
            .unwrap_or_default();

        Ok(UploadForm {
            id,
            title,
            short_description,
            keywords,
            content,
        })
    }
}

/// Whether a part is markdown.
///
/// The declared type decides, unless it is missing or
/// `application/octet-stream`, in which case the file name is consulted.
#[must_use]
pub fn is_markdown(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    match declared {
        Some(ct) => ct == MARKDOWN,
        None => file_name
            .and_then(|name| mime_guess::from_path(name).first())
            .is_some_and(|mime| mime.essence_str() == MARKDOWN),
    }
}

/// Keywords from repeated parts, or one part holding a JSON array.
fn parse_keywords(parts: Vec<String>) -> ApiResult<Vec<String>> {
    let mut keywords = Vec::new();
    for part in parts {
        let part = part.trim();
        if part.starts_with('[') {
            let list: Vec<String> = serde_json::from_str(part).map_err(|_| {
                ApiError::BadRequest("Keywords must be an array of strings.".into())
            })?;
            keywords.extend(list);
        } else {
            keywords.push(part.to_string());
        }
    }
    keywords.retain(|keyword| !keyword.trim().is_empty());
    for keyword in &mut keywords {
        *keyword = keyword.trim().to_string();
    }
    Ok(keywords)
}

fn required(value: Option<String>, message: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.into()))
}

fn too_many_files(max_files: usize) -> ApiError {
    ApiError::BadRequest(format!("Too many files: at most {max_files} allowed"))
}
