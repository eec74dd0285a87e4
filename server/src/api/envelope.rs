//! Error envelope.
//!
//! Every 4xx/5xx response leaves the server as
//! `{ statusCode, timestamp, path, message }`, whether it came from a
//! handler, an extractor rejection or the router itself. Internal failures
//! are additionally written to the `logs` table in the background.

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use super::AppState;
use crate::audit;
use crate::error::{ErrorReport, InternalFailure, INTERNAL_MESSAGE};

/// Largest framework error body read back into the envelope message.
const MAX_REJECTION_BODY: usize = 16 * 1024;

/// Client-facing error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub message: String,
}

/// Rewrite error responses into [`ErrorEnvelope`].
pub async fn error_envelope(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();

    let message = if let Some(report) = parts.extensions.get::<ErrorReport>() {
        report.message.clone()
    } else if status.is_server_error() {
        INTERNAL_MESSAGE.to_string()
    } else {
        let bytes = to_bytes(body, MAX_REJECTION_BODY).await.unwrap_or_default();
        let text = String::from_utf8_lossy(&bytes).trim().to_string();
        if text.is_empty() {
            status.canonical_reason().unwrap_or("Error").to_string()
        } else {
            text
        }
    };

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    if let Some(failure) = parts.extensions.get::<InternalFailure>().cloned() {
        persist_failure(&state, &failure, &path, &timestamp);
    }

    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);

    let mut enveloped = (
        status,
        Json(ErrorEnvelope {
            status_code: status.as_u16(),
            timestamp,
            path,
            message,
        }),
    )
        .into_response();

    for (name, value) in &parts.headers {
        enveloped.headers_mut().append(name.clone(), value.clone());
    }
    enveloped
}

/// Best-effort write of an internal failure to the diagnostic log.
fn persist_failure(state: &AppState, failure: &InternalFailure, path: &str, timestamp: &str) {
    let document = json!({
        "operation": failure.operation,
        "message": failure.message,
        "path": path,
        "timestamp": timestamp,
    })
    .to_string();

    let db = state.db.clone();
    tokio::spawn(async move {
        if let Err(e) = audit::write_log(&db, &document).await {
            tracing::warn!(error = %e, "Failed to persist internal error log");
        }
    });
}
