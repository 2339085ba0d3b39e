//! Configuration loader for Clarimed.
//!
//! Reads `clarimed.toml` and deserializes it into [`AppConfig`]. Falls back
//! to compiled-in defaults when the file is missing or malformed. Credentials
//! never come from the file; they are resolved from the environment by
//! [`load_secrets`].

use std::path::Path;

use secrecy::SecretString;

use clarimed_types::config::{AppConfig, Secrets};

/// Environment variable holding the completion service API key.
pub const COMPLETION_API_KEY_VAR: &str = "GROQ_API_KEY";

/// Environment variable holding the payment callback shared secret.
pub const MERCHANT_SECRET_VAR: &str = "CLARIMED_MERCHANT_SECRET";

/// Load application configuration from a `clarimed.toml` path.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_app_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Resolve credentials from the environment.
///
/// Missing or blank variables yield `None`; callers decide whether that is
/// fatal. The serve command treats a missing completion key as a startup
/// error, while a missing merchant secret only disables payment callbacks.
pub fn load_secrets() -> Secrets {
    Secrets {
        completion_api_key: env_secret(COMPLETION_API_KEY_VAR),
        merchant_secret: env_secret(MERCHANT_SECRET_VAR),
    }
}

fn env_secret(name: &str) -> Option<SecretString> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_app_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_app_config(&tmp.path().join("clarimed.toml")).await;
        assert_eq!(config.completion.model, "llama-3.3-70b-versatile");
        assert_eq!(config.budget.context_window, 131_072);
    }

    #[tokio::test]
    async fn load_app_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("clarimed.toml");
        tokio::fs::write(
            &config_path,
            r#"
[completion]
model = "llama-3.1-8b-instant"

[history]
ask_window = 20
"#,
        )
        .await
        .unwrap();

        let config = load_app_config(&config_path).await;
        assert_eq!(config.completion.model, "llama-3.1-8b-instant");
        assert_eq!(config.history.ask_window, 20);
        // Untouched sections keep their defaults
        assert_eq!(config.history.explain_window, 5);
    }

    #[tokio::test]
    async fn load_app_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("clarimed.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_app_config(&config_path).await;
        assert_eq!(config.completion.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn env_secret_present() {
        // SAFETY: test-specific variable name, cleaned up before the test ends.
        unsafe { std::env::set_var("CLARIMED_TEST_SECRET_1", "gsk_value") };

        assert!(env_secret("CLARIMED_TEST_SECRET_1").is_some());

        // SAFETY: the var was just set above.
        unsafe { std::env::remove_var("CLARIMED_TEST_SECRET_1") };
    }

    #[test]
    fn env_secret_missing_or_blank() {
        assert!(env_secret("CLARIMED_TEST_SECRET_NONEXISTENT").is_none());

        // SAFETY: test-specific variable name, cleaned up before the test ends.
        unsafe { std::env::set_var("CLARIMED_TEST_SECRET_2", "   ") };
        assert!(env_secret("CLARIMED_TEST_SECRET_2").is_none());
        // SAFETY: the var was just set above.
        unsafe { std::env::remove_var("CLARIMED_TEST_SECRET_2") };
    }
}
