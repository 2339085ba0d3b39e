//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Domain errors carry typed variants; the mapping below decides status,
//! machine-readable code, and user-facing message. Raw storage and network
//! error bodies never reach the client. Quota denial is not here at all --
//! it is a business outcome rendered as a success payload.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use clarimed_core::session::{AnalyzeError, AskError};
use clarimed_types::error::{ExtractError, PaymentError, RepositoryError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Report analysis errors.
    Analyze(AnalyzeError),
    /// Question answering errors.
    Ask(AskError),
    /// Storage errors from handlers that bypass the orchestrator.
    Repository(RepositoryError),
    /// Payment callback errors.
    Payment(PaymentError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Upload exceeding the configured size cap.
    PayloadTooLarge(String),
    /// A collaborator this request depends on is not configured.
    Config(String),
}

impl From<AnalyzeError> for AppError {
    fn from(e: AnalyzeError) -> Self {
        AppError::Analyze(e)
    }
}

impl From<AskError> for AppError {
    fn from(e: AskError) -> Self {
        AppError::Ask(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        AppError::Payment(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Analyze(AnalyzeError::ExtractionQuality { chars }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_QUALITY",
                format!(
                    "Could not read enough text from this file ({chars} characters). Please upload a clearer copy."
                ),
            ),
            AppError::Analyze(AnalyzeError::Extract(ExtractError::UnsupportedType(name))) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FILE_TYPE",
                format!("Unsupported file type: '{name}'"),
            ),
            AppError::Analyze(AnalyzeError::Extract(ExtractError::Unavailable(_))) => (
                StatusCode::BAD_GATEWAY,
                "EXTRACTION_UNAVAILABLE",
                "The text extraction service is unavailable. Please try again shortly.".to_string(),
            ),
            AppError::Analyze(AnalyzeError::Extract(ExtractError::Timeout(ms))) => (
                StatusCode::BAD_GATEWAY,
                "EXTRACTION_TIMEOUT",
                format!("Text extraction timed out after {ms} ms. Please try again."),
            ),
            AppError::Analyze(AnalyzeError::Extract(ExtractError::Failed(_))) => (
                StatusCode::BAD_GATEWAY,
                "EXTRACTION_FAILED",
                "Text extraction failed. Please try again.".to_string(),
            ),
            AppError::Ask(AskError::EmptyQuestion) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Question must not be empty".to_string(),
            ),
            AppError::Ask(AskError::ContextTooLarge { prompt_tokens }) => (
                StatusCode::BAD_REQUEST,
                "CONTEXT_TOO_LARGE",
                format!(
                    "This conversation has grown too large to answer ({prompt_tokens} tokens). Start a new chat or shorten the question."
                ),
            ),
            AppError::Ask(AskError::Upstream(_)) => (
                StatusCode::BAD_GATEWAY,
                "COMPLETION_FAILED",
                "The language model did not return an answer. Please try again.".to_string(),
            ),
            AppError::Repository(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string())
            }
            AppError::Analyze(AnalyzeError::Repository(_))
            | AppError::Ask(AskError::Repository(_))
            | AppError::Repository(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "A storage error occurred. Please try again.".to_string(),
            ),
            AppError::Payment(PaymentError::InvalidSignature) => (
                StatusCode::FORBIDDEN,
                "PAYMENT_VERIFICATION_FAILED",
                "Payment signature verification failed".to_string(),
            ),
            AppError::Payment(PaymentError::Malformed(msg)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Malformed payment callback: {msg}"),
            ),
            AppError::Payment(PaymentError::UnknownPlan(plan)) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_PLAN",
                format!("Unknown plan: '{plan}'"),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                msg.clone(),
            ),
        };

        let body = ApiResponse::error(code, &message, Uuid::now_v7().to_string());
        (status, Json(body)).into_response()
    }
}
