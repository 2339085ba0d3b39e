//! Session listing, history, and deletion handlers.
//!
//! Endpoints:
//! - GET    /api/v1/chat/sessions                    - List the caller's sessions
//! - GET    /api/v1/chat/sessions/{chat_id}/messages - Ordered session history
//! - DELETE /api/v1/chat/sessions/{chat_id}          - Hard-delete a session

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use clarimed_types::chat::{ChatMessage, SessionSummary};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    /// Trailing window size; the service default applies when absent.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// GET /api/v1/chat/sessions - List sessions, most recently active first.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state.chat_service.list_sessions(&auth.user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(sessions, request_id, elapsed)
        .with_link("self", "/api/v1/chat/sessions");

    Ok(Json(resp))
}

/// GET /api/v1/chat/sessions/{chat_id}/messages - Session history.
///
/// Returns the trailing `limit` messages, oldest first. The ledger is
/// faithful: system entries (e.g. upload events) are included. A session
/// with no messages returns an empty list, not an error.
pub async fn get_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(chat_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let messages = state
        .chat_service
        .history(&auth.user_id, &chat_id, query.limit)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let self_link = format!("/api/v1/chat/sessions/{chat_id}/messages");
    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link("self", &self_link)
        .with_link("sessions", "/api/v1/chat/sessions");

    Ok(Json(resp))
}

/// DELETE /api/v1/chat/sessions/{chat_id} - Delete a session and all its
/// messages. Irreversible; deleting a session that never existed reports
/// zero removed messages.
pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let removed = state
        .chat_service
        .delete_session(&auth.user_id, &chat_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(
        serde_json::json!({"deleted": true, "chat_id": chat_id, "messages_removed": removed}),
        request_id,
        elapsed,
    )
    .with_link("sessions", "/api/v1/chat/sessions");

    Ok(Json(resp))
}
