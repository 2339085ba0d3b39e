use thiserror::Error;

/// Errors from repository operations (used by trait definitions in clarimed-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the external text-extraction collaborator.
///
/// Extraction failures are describable, not exceptional: the orchestrator
/// inspects them to decide whether the upload is retryable by the user.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: '{0}'")]
    UnsupportedType(String),

    #[error("extraction service unavailable: {0}")]
    Unavailable(String),

    #[error("extraction failed: {0}")]
    Failed(String),

    #[error("extraction timed out after {0} ms")]
    Timeout(u64),
}

/// Errors from payment callback processing.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment signature verification failed")]
    InvalidSignature,

    #[error("malformed payment callback: {0}")]
    Malformed(String),

    #[error("unknown plan: '{0}'")]
    UnknownPlan(String),
}

/// Errors from configuration loading and credential resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required credential: {0}")]
    MissingCredential(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
