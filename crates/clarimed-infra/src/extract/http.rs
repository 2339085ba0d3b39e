//! HttpTextExtractor -- concrete [`TextExtractor`] over the extraction sidecar.
//!
//! Sends the raw file bytes to `POST {base_url}/extract?kind={pdf|image}`
//! and reads back `{"text": "..."}`. The sidecar owns PDF parsing and OCR;
//! failures are mapped into [`ExtractError`] so the orchestrator can tell
//! a dead sidecar from an unreadable document.

use std::time::Duration;

use serde::Deserialize;

use clarimed_core::extract::{FileKind, TextExtractor};
use clarimed_types::config::ExtractConfig;
use clarimed_types::error::ExtractError;

/// Response body from the extraction sidecar.
#[derive(Debug, Deserialize)]
struct ExtractResponse {
    text: String,
}

/// HTTP client for the text-extraction sidecar.
#[derive(Debug, Clone)]
pub struct HttpTextExtractor {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpTextExtractor {
    /// Create a new extractor client from configuration.
    pub fn new(config: &ExtractConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_secs * 1000,
        }
    }

    /// Build the extraction endpoint URL for a file kind.
    fn endpoint(&self, kind: FileKind) -> String {
        format!("{}/extract?kind={}", self.base_url, kind.as_str())
    }
}

impl TextExtractor for HttpTextExtractor {
    async fn extract(&self, data: &[u8], kind: FileKind) -> Result<String, ExtractError> {
        let url = self.endpoint(kind);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout(self.timeout_ms)
                } else if e.is_connect() {
                    ExtractError::Unavailable(e.to_string())
                } else {
                    ExtractError::Failed(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                415 => ExtractError::UnsupportedType(kind.as_str().to_string()),
                502 | 503 => ExtractError::Unavailable(error_body),
                _ => ExtractError::Failed(format!("HTTP {status}: {error_body}")),
            });
        }

        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Failed(format!("failed to parse response: {e}")))?;

        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_per_kind() {
        let extractor = HttpTextExtractor::new(&ExtractConfig::default());
        assert_eq!(
            extractor.endpoint(FileKind::Pdf),
            "http://127.0.0.1:5055/extract?kind=pdf"
        );
        assert_eq!(
            extractor.endpoint(FileKind::Image),
            "http://127.0.0.1:5055/extract?kind=image"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ExtractConfig {
            base_url: "http://10.0.0.5:5055/".to_string(),
            ..ExtractConfig::default()
        };
        let extractor = HttpTextExtractor::new(&config);
        assert_eq!(
            extractor.endpoint(FileKind::Pdf),
            "http://10.0.0.5:5055/extract?kind=pdf"
        );
    }

    #[test]
    fn test_timeout_carried_in_ms() {
        let config = ExtractConfig {
            timeout_secs: 30,
            ..ExtractConfig::default()
        };
        let extractor = HttpTextExtractor::new(&config);
        assert_eq!(extractor.timeout_ms, 30_000);
    }

    #[test]
    fn test_response_deserialization() {
        let body: ExtractResponse =
            serde_json::from_str(r#"{"text": "CBC Report\nHemoglobin: 13.9"}"#).unwrap();
        assert!(body.text.starts_with("CBC Report"));
    }

    #[test]
    fn test_response_tolerates_extra_fields() {
        let body: ExtractResponse =
            serde_json::from_str(r#"{"text": "scanned page", "pages": 2}"#).unwrap();
        assert_eq!(body.text, "scanned page");
    }
}
