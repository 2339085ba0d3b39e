//! CompletionBackend trait definition.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition). One
//! request, one full response; the reply budget is fixed by the caller
//! through `CompletionRequest::max_tokens` before the call is made.

use clarimed_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for chat-completion backends (Groq, any OpenAI-compatible host).
///
/// Implementations live in clarimed-infra (e.g. `OpenAiCompatBackend`).
pub trait CompletionBackend: Send + Sync {
    /// Human-readable backend name (e.g. "groq").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
