//! Bearer token authentication extractor.
//!
//! Extracts and verifies login tokens from:
//! - `Authorization: Bearer <token>` header
//! - `X-Auth-Token: <token>` header
//!
//! Tokens are SHA-256 hashed and compared against the `auth_tokens` table;
//! the store refreshes `last_used_at` on a hit.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use clarimed_core::subscription::store::UserStore;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller. Extracting this validates the bearer token.
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        let user_id = state
            .tokens
            .resolve(&token)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "Invalid token. Provide a valid token via 'Authorization: Bearer <token>' or 'X-Auth-Token: <token>' header.".to_string(),
                )
            })?;

        // Record activity (best effort, don't fail the request)
        let _ = state.users.touch_last_active(&user_id).await;

        Ok(AuthUser { user_id })
    }
}

/// Extract the bearer token from request headers.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    // Try Authorization: Bearer <token>
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    // Try X-Auth-Token header
    if let Some(token) = parts.headers.get("x-auth-token") {
        let token_str = token.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-Auth-Token header encoding".to_string())
        })?;
        return Ok(token_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing token. Provide via 'Authorization: Bearer <token>' or 'X-Auth-Token: <token>' header.".to_string(),
    ))
}
