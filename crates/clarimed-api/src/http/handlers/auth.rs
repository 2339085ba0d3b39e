//! Login handler.
//!
//! Endpoint:
//! - POST /api/v1/auth/session - Exchange identity-provider claims for a
//!   bearer token (unauthenticated)

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use uuid::Uuid;

use clarimed_core::subscription::store::UserStore;
use clarimed_types::plan::Plan;
use clarimed_types::user::{IdentityClaims, User};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Response payload for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Plaintext bearer token. Shown once; only its hash is stored.
    pub token: String,
    pub user: User,
    pub plan: Plan,
}

/// POST /api/v1/auth/session - Upsert the user and mint a bearer token.
///
/// The caller presents claims it obtained from the identity provider. The
/// user is keyed by `external_user_id`; repeat logins refresh the profile
/// and mint a fresh token without touching the stored plan.
pub async fn login(
    State(state): State<AppState>,
    Json(claims): Json<IdentityClaims>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if claims.external_user_id.trim().is_empty() {
        return Err(AppError::Validation(
            "external_user_id must not be empty".to_string(),
        ));
    }

    let mut user = state.users.upsert_identity(&claims).await?;
    let token = state.tokens.mint(&user.id).await?;
    let plan = state.subscription_service.get_active_plan(&user.id).await?;
    if user.plan != plan.id {
        // get_active_plan corrected a lapsed plan; mirror the stored state
        user.plan = plan.id;
        user.plan_expires_at = None;
    }

    tracing::info!(user_id = %user.id, plan = %plan.id, "User logged in");

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(LoginResponse { token, user, plan }, request_id, elapsed)
        .with_link("self", "/api/v1/auth/session")
        .with_link("sessions", "/api/v1/chat/sessions");

    Ok(Json(resp))
}
