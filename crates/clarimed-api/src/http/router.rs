//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`. Middleware: CORS (any origin, matching
//! the browser-facing deployments this serves), request tracing.
//!
//! Unauthenticated routes: `/health`, login, the plan catalog, and the
//! payment callback (authenticated by its HMAC signature instead).

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Uploads carry multipart framing on top of the file itself.
    let upload_body_limit = state.config.upload.max_bytes as usize + 1024 * 1024;

    let api_routes = Router::new()
        // Auth
        .route("/auth/session", post(handlers::auth::login))
        // Reports
        .route(
            "/reports/analyze",
            post(handlers::report::analyze_report)
                .layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        // Chat
        .route("/chat/ask", post(handlers::chat::ask))
        .route("/chat/sessions", get(handlers::session::list_sessions))
        .route(
            "/chat/sessions/{chat_id}/messages",
            get(handlers::session::get_messages),
        )
        .route(
            "/chat/sessions/{chat_id}",
            delete(handlers::session::delete_session),
        )
        // Billing
        .route("/billing/plans", get(handlers::billing::list_plans))
        .route("/billing/callback", post(handlers::billing::payment_callback));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "completion_credential": state.secrets.completion_api_key.is_some(),
    }))
}
