//! Completion backend implementations.
//!
//! Contains the concrete implementation of the [`CompletionBackend`] trait
//! defined in `clarimed-core`. A single OpenAI-compatible client covers
//! Groq and any other host speaking the chat completions protocol; which
//! host is deployed is configuration, not code.
//!
//! [`CompletionBackend`]: clarimed_core::llm::CompletionBackend

pub mod openai_compat;

use clarimed_types::config::CompletionConfig;
use clarimed_types::llm::LlmError;

use self::openai_compat::{OpenAiCompatBackend, OpenAiCompatConfig};

/// Build the completion backend from configuration and a resolved API key.
///
/// The key is resolved from the environment by the caller (see
/// `config::load_secrets`); this function never touches the environment
/// itself.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is available.
pub fn create_backend(
    config: &CompletionConfig,
    api_key: Option<&str>,
) -> Result<OpenAiCompatBackend, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;

    Ok(OpenAiCompatBackend::new(OpenAiCompatConfig {
        backend_name: "groq".to_string(),
        api_base: config.api_base.clone(),
        api_key: key.to_string(),
        model: config.model.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarimed_core::llm::CompletionBackend;

    #[test]
    fn test_create_backend_with_key() {
        let config = CompletionConfig::default();
        let backend = create_backend(&config, Some("gsk_test_key")).unwrap();
        assert_eq!(backend.name(), "groq");
    }

    #[test]
    fn test_create_backend_missing_key() {
        let config = CompletionConfig::default();
        let result = create_backend(&config, None);
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
    }
}
