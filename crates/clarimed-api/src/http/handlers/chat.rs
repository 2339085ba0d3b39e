//! Question answering handler.
//!
//! Endpoint:
//! - POST /api/v1/chat/ask - Ask one question within a chat session

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clarimed_core::session::AskOutcome;
use clarimed_types::llm::TokenUsage;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request payload for asking a question.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Session to continue; a fresh one is opened when absent.
    #[serde(default)]
    pub chat_id: Option<String>,
    pub message: String,
    /// Report to ground the answer on.
    #[serde(default)]
    pub report_id: Option<Uuid>,
}

/// Response payload for an ask. Covers both outcomes: an answer, or the
/// structured quota denial (`quota_exceeded: true`, no reply).
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub chat_id: String,
    pub quota_exceeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// Display name of the governing plan.
    pub plan: String,
    /// Questions consumed in this session.
    pub used: u32,
    /// The plan's allowance; null for unlimited plans.
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/v1/chat/ask - Answer one question.
///
/// A quota denial is a 200 with `quota_exceeded: true` -- the caller renders
/// an upgrade prompt from `plan`/`used`/`limit`, and nothing was charged.
pub async fn ask(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AskRequest>,
) -> Result<Json<ApiResponse<AskResponse>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let outcome = state
        .orchestrator
        .ask(auth.user_id, req.chat_id.clone(), &req.message, req.report_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let data = match outcome {
        AskOutcome::Answered(detail) => AskResponse {
            chat_id: detail.chat_id,
            quota_exceeded: false,
            reply: Some(detail.reply),
            plan: detail.plan,
            used: detail.used,
            limit: detail.limit,
            usage: Some(detail.usage),
            message: None,
        },
        AskOutcome::QuotaExceeded(denial) => {
            let message = match denial.limit {
                Some(limit) => format!(
                    "You have used all {limit} questions for this chat on the {}. Upgrade your plan to continue.",
                    denial.plan
                ),
                None => "Question limit reached for this chat.".to_string(),
            };
            AskResponse {
                // Denial only happens on a session with history, so the
                // caller always named the chat.
                chat_id: req.chat_id.unwrap_or_default(),
                quota_exceeded: true,
                reply: None,
                plan: denial.plan,
                used: denial.used,
                limit: denial.limit,
                usage: None,
                message: Some(message),
            }
        }
    };

    let messages_link = format!("/api/v1/chat/sessions/{}/messages", data.chat_id);
    let resp = ApiResponse::success(data, request_id, elapsed)
        .with_link("self", "/api/v1/chat/ask")
        .with_link("messages", &messages_link)
        .with_link("plans", "/api/v1/billing/plans");

    Ok(Json(resp))
}
