//! Report upload and analysis handler.
//!
//! Endpoint:
//! - POST /api/v1/reports/analyze - Upload a report file, extract its text,
//!   and return the stored report with an automatic explanation

use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use serde::Serialize;
use uuid::Uuid;

use clarimed_types::config::Language;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Response payload for a successful analysis.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub chat_id: String,
    pub report_id: Uuid,
    pub extracted_text: String,
    /// The automatic first explanation; null when that best-effort step
    /// failed (the upload itself still succeeded).
    pub explanation: Option<String>,
}

/// POST /api/v1/reports/analyze - Analyze an uploaded report.
///
/// Multipart form: a required `file` part plus optional `chat_id` (attach to
/// an existing session) and `language` (en/hi/gu, default en) text parts.
/// The extension allow-list and size cap are enforced here before any
/// extraction work starts.
pub async fn analyze_report(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<AnalyzeResponse>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let mut file: Option<(String, Bytes)> = None;
    let mut chat_id: Option<String> = None;
    let mut language = Language::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Validation("The 'file' part must carry a filename".to_string())
                    })?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((filename, data));
            }
            Some("chat_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid chat_id part: {e}")))?;
                if !text.trim().is_empty() {
                    chat_id = Some(text);
                }
            }
            Some("language") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid language part: {e}")))?;
                language = text.trim().parse().map_err(AppError::Validation)?;
            }
            _ => {}
        }
    }

    let (filename, data) = file
        .ok_or_else(|| AppError::Validation("Missing 'file' part".to_string()))?;

    if !state.config.upload.allows(&filename) {
        return Err(AppError::Validation(format!(
            "Unsupported file type: '{filename}'. Allowed extensions: {}",
            state.config.upload.allowed_extensions.join(", ")
        )));
    }
    let max_bytes = state.config.upload.max_bytes;
    if data.len() as u64 > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} MiB upload limit",
            max_bytes / (1024 * 1024)
        )));
    }

    let outcome = state
        .orchestrator
        .analyze_report(auth.user_id, chat_id, &filename, &data, language)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let messages_link = format!("/api/v1/chat/sessions/{}/messages", outcome.chat_id);
    let resp = ApiResponse::success(
        AnalyzeResponse {
            chat_id: outcome.chat_id,
            report_id: outcome.report_id,
            extracted_text: outcome.extracted_text,
            explanation: outcome.explanation,
        },
        request_id,
        elapsed,
    )
    .with_link("self", "/api/v1/reports/analyze")
    .with_link("ask", "/api/v1/chat/ask")
    .with_link("messages", &messages_link);

    Ok(Json(resp))
}
